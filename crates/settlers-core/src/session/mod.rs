//! A single game session: validated, atomic command application over shared state.
//!
//! Commands run on a scratch copy of [`SessionState`] and are committed only when they succeed,
//! so a rejected command changes nothing and emits nothing. Each success yields the recorded
//! [`Action`] and the ordered, visibility-scoped events describing it.

mod build;
mod cards;
mod dice;
mod snapshot;
mod state;
mod trade;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use settlers_protocol::{
    Command, Coord, DevCardKind, Phase, PieceKind, PlayerId, ResourceSet, SessionId,
    SessionSnapshot,
};
use tracing::debug;

use crate::event_log::EventLog;
use crate::layout::BoardLayout;
use crate::ledger::Action;
use crate::placement::{Placement, StandardPlacement};
use crate::player::Player;
use crate::rng::{Dice, SeededDice};
use crate::route_graph::RouteGraph;
use crate::visibility::ScopedEvent;
use crate::Rejection;

pub use snapshot::{redact_snapshot, ResumeError};
use state::{Rules, SessionState};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub winning_score: u32,
    /// Hands above this size lose half on a seven.
    pub hand_limit: u32,
    /// Seeds the deck shuffle, steals and the default dice.
    pub seed: u64,
    /// Let players ask to build between turns (the 5-6 player rule).
    pub special_building: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            winning_score: 10,
            hand_limit: 7,
            seed: 0,
            special_building: false,
        }
    }
}

/// Seats are numbered by a `u8`.
pub const MAX_SEATS: usize = u8::MAX as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("a session needs at least one player")]
    NoPlayers,
    #[error("{0} players do not fit in {MAX_SEATS} seats")]
    TooManyPlayers(usize),
}

/// Result of a successfully applied command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    /// `None` for trade negotiation (offers), which changes no game state.
    pub action: Option<Action>,
    pub events: Vec<ScopedEvent>,
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    layout: Arc<BoardLayout>,
    placement: Arc<dyn Placement>,
    dice: Box<dyn Dice>,
    options: SessionOptions,
    log: EventLog,
}

impl Session {
    /// New session with seats numbered in `names` order; seat 0 rolls first.
    pub fn new(
        id: SessionId,
        layout: Arc<BoardLayout>,
        names: &[String],
        options: SessionOptions,
    ) -> Result<Self, SetupError> {
        let state = SessionState::new(names, &layout, options.seed)?;
        Ok(Self {
            id,
            state,
            layout,
            placement: Arc::new(StandardPlacement),
            dice: Box::new(SeededDice::new(options.seed.wrapping_add(1))),
            options,
            log: EventLog::default(),
        })
    }

    /// Continue a saved session. The action history is not restored, so nothing before the
    /// snapshot can be undone.
    pub fn resume(
        id: SessionId,
        snapshot: &SessionSnapshot,
        layout: Arc<BoardLayout>,
        options: SessionOptions,
    ) -> Result<Self, ResumeError> {
        let state = SessionState::resume(snapshot, &layout)?;
        Ok(Self {
            id,
            state,
            layout,
            placement: Arc::new(StandardPlacement),
            dice: Box::new(SeededDice::new(options.seed.wrapping_add(1))),
            options,
            log: EventLog::default(),
        })
    }

    pub fn with_dice(mut self, dice: impl Dice + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    pub fn with_placement(mut self, placement: Arc<dyn Placement>) -> Self {
        self.placement = placement;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.state.machine.phase()
    }

    pub fn current_player(&self) -> PlayerId {
        self.state.machine.current_player()
    }

    pub fn players(&self) -> &[Player] {
        &self.state.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.state.players.get(id.index())
    }

    pub fn hand(&self, id: PlayerId) -> ResourceSet {
        self.state.resources.hand(id)
    }

    pub fn graph(&self) -> &RouteGraph {
        &self.state.graph
    }

    pub fn robber(&self) -> Coord {
        self.state.robber
    }

    pub fn pirate(&self) -> Option<Coord> {
        self.state.pirate
    }

    pub fn largest_army(&self) -> Option<PlayerId> {
        self.state.largest_army
    }

    pub fn deck_len(&self) -> usize {
        self.state.deck.len()
    }

    pub fn public_score(&self, id: PlayerId) -> u32 {
        self.state.public_score(id)
    }

    pub fn total_score(&self, id: PlayerId) -> u32 {
        self.state.total_score(id)
    }

    /// The current (last applied) action.
    pub fn last_action(&self) -> Option<&Action> {
        self.state.ledger.last()
    }

    /// Every event emitted so far, with its visibility.
    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Validate and apply one command for `player`.
    pub fn apply(&mut self, player: PlayerId, command: Command) -> Result<Applied, Rejection> {
        let name = command.name();
        if let Err(reason) = self.state.machine.check(player, &command) {
            debug!(session = %self.id, player = %player, command = name, %reason, "command rejected");
            return Err(reason);
        }
        let roll = matches!(command, Command::RollDice).then(|| self.dice.roll());

        let rules = Rules {
            layout: &self.layout,
            placement: self.placement.as_ref(),
            options: &self.options,
        };
        let mut scratch = self.state.clone();
        let mut events = Vec::new();
        match scratch.run(rules, player, command, roll, &mut events) {
            Ok(action) => {
                debug!(
                    session = %self.id,
                    player = %player,
                    command = name,
                    events = events.len(),
                    phase = ?scratch.machine.phase(),
                    "command applied"
                );
                self.state = scratch;
                self.log.record_all(&events);
                Ok(Applied { action, events })
            }
            Err(reason) => {
                debug!(session = %self.id, player = %player, command = name, %reason, "command rejected");
                Err(reason)
            }
        }
    }

    /// Undo the last build (`moved_from` = `Coord::NONE`) or ship move.
    pub fn undo(
        &mut self,
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
        moved_from: Coord,
    ) -> Result<Applied, Rejection> {
        self.apply(
            player,
            Command::Undo {
                piece,
                at,
                moved_from,
            },
        )
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    /// Snapshot as seen from one seat.
    pub fn snapshot_for_player(&self, player: PlayerId) -> SessionSnapshot {
        redact_snapshot(&self.state.snapshot(), Some(player))
    }

    /// Snapshot as seen by a non-seated observer.
    pub fn snapshot_for_observer(&self) -> SessionSnapshot {
        redact_snapshot(&self.state.snapshot(), None)
    }

    // Setup helpers: scenario seeding outside of normal play. No events, no ledger entries.

    /// Place a piece without cost or placement rules. Longest route is recomputed.
    pub fn seed_piece(
        &mut self,
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
    ) -> Result<(), Rejection> {
        self.state.player(player)?;
        if piece == PieceKind::City && self.state.graph.piece_at(at).is_none() {
            self.state
                .graph
                .add_piece(player, PieceKind::Settlement, at)?;
        }
        self.state.graph.add_piece(player, piece, at)?;
        let holder = self.state.graph.best_holder();
        self.state.graph.set_holder(holder);
        Ok(())
    }

    pub fn set_resources(&mut self, player: PlayerId, resources: ResourceSet) {
        self.state.resources.set(player, resources);
    }

    /// Put a playable card in `player`'s hand.
    pub fn give_dev_card(&mut self, player: PlayerId, card: DevCardKind) -> Result<(), Rejection> {
        self.state.player_mut(player)?.dev_cards.push(card);
        Ok(())
    }

    /// Replace the deck; `cards[0]` is drawn first.
    pub fn stack_deck(&mut self, cards: Vec<DevCardKind>) {
        self.state.deck = cards.into_iter().rev().collect();
    }
}

impl SessionState {
    fn run(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        command: Command,
        roll: Option<[u8; 2]>,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Option<Action>, Rejection> {
        if !command.coords().into_iter().all(Coord::is_canonical) {
            return Err(Rejection::IllegalPlacement);
        }
        let action = match command {
            Command::RollDice => {
                let dice = roll.ok_or(Rejection::WrongPhase)?;
                self.roll_dice(rules, player, dice, out)?
            }
            Command::EndTurn => self.end_turn(player, out)?,
            Command::RequestBuild { piece } => self.request_build(player, piece, out)?,
            Command::CancelBuild => self.cancel_build(player, out)?,
            Command::Build { piece, at } => self.build(rules, player, piece, at, out)?,
            Command::AskSpecialBuild => self.ask_special_build(rules, player, out)?,
            Command::MovePiece { piece, from, to } => {
                self.move_piece(rules, player, piece, from, to, out)?
            }
            // The ledger appends the undo action itself.
            Command::Undo {
                piece,
                at,
                moved_from,
            } => return self.undo(player, piece, at, moved_from, out).map(Some),
            Command::BuyDevCard => self.buy_dev_card(rules, player, out)?,
            Command::PlayDevCard { card } => self.play_dev_card(rules, player, card, out)?,
            Command::PickMonopoly { resource } => self.pick_monopoly(player, resource, out)?,
            Command::PickResources { resources } => self.pick_resources(player, resources, out)?,
            Command::Discard { resources } => self.discard(rules, player, resources, out)?,
            Command::ChooseRobberOrPirate { pirate } => {
                self.choose_robber_or_pirate(rules, player, pirate, out)?
            }
            Command::MoveRobber { hex, victim } => {
                self.move_robber(rules, player, hex, victim, out)?
            }
            Command::BankTrade { give, get } => self.bank_trade(rules, player, give, get, out)?,
            Command::MakeOffer { to, give, get } => {
                self.make_offer(player, to, give, get, out)?;
                return Ok(None);
            }
            Command::ClearOffer => {
                self.clear_offer(player, out);
                return Ok(None);
            }
            Command::AcceptOffer { from } => self.accept_offer(player, from, out)?,
            Command::Unsupported => return Err(Rejection::UnknownActionKind),
        };
        self.ledger.append(action.clone());
        Ok(Some(action))
    }
}
