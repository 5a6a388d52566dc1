use std::collections::{BTreeMap, BTreeSet};

use settlers_protocol::{
    Coord, DevCardAction, DevCardKind, Event, Phase, PieceKind, PlayerId, ResourceSet,
};

use crate::layout::BoardLayout;
use crate::ledger::{Action, ActionKind, ActionLedger, Effect, EffectTarget};
use crate::phase::SessionStateMachine;
use crate::placement::{BoardView, Placement};
use crate::player::Player;
use crate::resources::ResourceLedger;
use crate::rng::GameRng;
use crate::route_graph::RouteGraph;
use crate::visibility::ScopedEvent;
use crate::Rejection;

use super::{SessionOptions, SetupError};

/// An open trade offer from one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Offer {
    pub to: Vec<PlayerId>,
    pub give: ResourceSet,
    pub get: ResourceSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BankTrade {
    pub player: PlayerId,
    pub give: ResourceSet,
    pub get: ResourceSet,
}

/// Read-only collaborators for one command.
#[derive(Clone, Copy)]
pub(crate) struct Rules<'a> {
    pub layout: &'a BoardLayout,
    pub placement: &'a dyn Placement,
    pub options: &'a SessionOptions,
}

/// Everything a command can change. Cloned for each command and committed only on success.
#[derive(Clone, Debug)]
pub(crate) struct SessionState {
    pub players: Vec<Player>,
    pub resources: ResourceLedger,
    pub graph: RouteGraph,
    pub ledger: ActionLedger,
    pub machine: SessionStateMachine,
    pub largest_army: Option<PlayerId>,
    /// Drawn from the back.
    pub deck: Vec<DevCardKind>,
    pub rng: GameRng,
    pub robber: Coord,
    pub pirate: Option<Coord>,
    pub pending_discards: BTreeMap<PlayerId, u32>,
    pub pending_gold: BTreeMap<PlayerId, u32>,
    pub offers: BTreeMap<PlayerId, Offer>,
    pub last_bank_trade: Option<BankTrade>,
    /// Ships built this turn; they stay put until the next one.
    pub ships_placed_this_turn: BTreeSet<Coord>,
    pub moved_ship_this_turn: bool,
}

/// 14 knights, 5 victory points, 2 each of road building, year of plenty and monopoly.
pub(crate) fn standard_deck(rng: &mut GameRng) -> Vec<DevCardKind> {
    let mut deck = Vec::with_capacity(25);
    deck.extend(std::iter::repeat(DevCardKind::Knight).take(14));
    deck.extend(std::iter::repeat(DevCardKind::VictoryPoint).take(5));
    for card in [
        DevCardKind::RoadBuilding,
        DevCardKind::YearOfPlenty,
        DevCardKind::Monopoly,
    ] {
        deck.extend([card, card]);
    }
    rng.shuffle(&mut deck);
    deck
}

impl SessionState {
    pub fn new(names: &[String], layout: &BoardLayout, seed: u64) -> Result<Self, SetupError> {
        let seats =
            u8::try_from(names.len()).map_err(|_| SetupError::TooManyPlayers(names.len()))?;
        if seats == 0 {
            return Err(SetupError::NoPlayers);
        }
        let mut rng = GameRng::seed_from_u64(seed);
        let deck = standard_deck(&mut rng);
        let players = (0..seats)
            .zip(names)
            .map(|(seat, name)| Player::new(PlayerId(seat), name.clone()))
            .collect::<Vec<_>>();
        Ok(Self {
            resources: ResourceLedger::new(players.len()),
            machine: SessionStateMachine::new(seats),
            players,
            graph: RouteGraph::new(),
            ledger: ActionLedger::new(),
            largest_army: None,
            deck,
            rng,
            robber: layout.robber_start(),
            pirate: layout.pirate_start(),
            pending_discards: BTreeMap::new(),
            pending_gold: BTreeMap::new(),
            offers: BTreeMap::new(),
            last_bank_trade: None,
            ships_placed_this_turn: BTreeSet::new(),
            moved_ship_this_turn: false,
        })
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, Rejection> {
        self.players
            .get(id.index())
            .ok_or(Rejection::NotCurrentPlayer)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, Rejection> {
        self.players
            .get_mut(id.index())
            .ok_or(Rejection::NotCurrentPlayer)
    }

    pub fn name(&self, id: PlayerId) -> String {
        self.players
            .get(id.index())
            .map_or_else(|| id.to_string(), |p| p.name.clone())
    }

    pub fn seats(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    pub fn view<'a>(&'a self, layout: &'a BoardLayout) -> BoardView<'a> {
        BoardView {
            layout,
            graph: &self.graph,
        }
    }

    pub fn pieces_left(&self, player: PlayerId, piece: PieceKind) -> u32 {
        self.players
            .get(player.index())
            .map_or(0, |p| p.pieces_left(&self.graph, piece))
    }

    pub fn total_score(&self, player: PlayerId) -> u32 {
        self.players
            .get(player.index())
            .map_or(0, |p| p.total_score(&self.graph, self.largest_army))
    }

    pub fn public_score(&self, player: PlayerId) -> u32 {
        self.players
            .get(player.index())
            .map_or(0, |p| p.public_score(&self.graph, self.largest_army))
    }

    /// Apply `effect` and record it on `action`.
    pub fn record(&mut self, action: &mut Action, effect: Effect) -> Result<(), Rejection> {
        let mut target = EffectTarget {
            resources: &mut self.resources,
            graph: &mut self.graph,
            largest_army: &mut self.largest_army,
        };
        effect.apply(&mut target)?;
        action.effects.push(effect);
        Ok(())
    }

    /// Recompute the longest-route holder, recording a change on `action`.
    pub fn update_longest_route(&mut self, action: &mut Action) -> Result<bool, Rejection> {
        let from = self.graph.holder();
        let to = self.graph.best_holder();
        if from == to {
            return Ok(false);
        }
        self.record(action, Effect::ChangeLongestRoute { from, to })?;
        Ok(true)
    }

    pub fn set_phase(&mut self, phase: Phase, out: &mut Vec<ScopedEvent>) {
        self.machine.set_phase(phase);
        out.push(ScopedEvent::all(Event::GameState { phase }));
    }

    /// Robber (or robber/pirate choice) after a seven or a knight. `back` is where play resumes.
    pub fn start_robber(&mut self, layout: &BoardLayout, back: Phase, out: &mut Vec<ScopedEvent>) {
        self.machine.set_robber_return(back);
        let phase = if layout.has_pirate() {
            Phase::WaitingForRobberOrPirate
        } else {
            Phase::PlacingRobber
        };
        self.set_phase(phase, out);
    }

    /// End the game if the current player has reached the winning score.
    pub fn check_win(&mut self, rules: Rules<'_>, out: &mut Vec<ScopedEvent>) -> bool {
        let player = self.machine.current_player();
        let points = self.total_score(player);
        if points < rules.options.winning_score {
            return false;
        }
        self.set_phase(Phase::GameOver, out);
        out.push(ScopedEvent::all(Event::Text {
            text: format!(
                ">>> {} has won the game with {points} points.",
                self.name(player)
            ),
        }));
        for p in &self.players {
            for card in p.dev_cards.iter().chain(&p.new_dev_cards) {
                if *card == DevCardKind::VictoryPoint {
                    out.push(ScopedEvent::all(Event::DevCardAction {
                        player: p.id,
                        action: DevCardAction::Reveal,
                        card: *card,
                    }));
                }
            }
        }
        out.push(ScopedEvent::all(Event::GameOver {
            winner: player,
            points,
        }));
        true
    }

    pub fn end_turn(
        &mut self,
        player: PlayerId,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        self.offers.clear();
        self.last_bank_trade = None;
        self.ships_placed_this_turn.clear();
        self.moved_ship_this_turn = false;
        self.player_mut(player)?.refresh_cards();
        out.push(ScopedEvent::all(Event::OfferCleared { player: None }));

        let after = self.machine.special_build_after().unwrap_or(player);
        if let Some(seat) = self.next_special_builder(after) {
            self.player_mut(seat)?.asked_special_build = false;
            self.machine.start_special_build(after, seat);
            out.push(ScopedEvent::all(Event::Turn {
                player: seat,
                phase: Phase::SpecialBuilding,
            }));
            return Ok(Action::new(ActionKind::EndTurn, player));
        }

        let next = self.machine.next_turn();
        out.push(ScopedEvent::all(Event::Turn {
            player: next,
            phase: Phase::AwaitingRoll,
        }));
        out.push(ScopedEvent::all(Event::RollDicePrompt { player: next }));
        Ok(Action::new(ActionKind::EndTurn, player))
    }

    /// First seat after `after`, in seat order, still waiting to build out of turn.
    fn next_special_builder(&self, after: PlayerId) -> Option<PlayerId> {
        let n = self.players.len();
        (1..n)
            .map(|k| &self.players[(after.index() + k) % n])
            .find(|p| p.asked_special_build)
            .map(|p| p.id)
    }
}
