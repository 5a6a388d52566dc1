use std::collections::BTreeMap;

use settlers_protocol::{
    BankTradeSnapshot, Coord, DevCardKind, OfferSnapshot, PendingPick, PieceKind,
    PieceSnapshot, PlayerId, PlayerSnapshot, SessionSnapshot,
};
use thiserror::Error;

use crate::layout::BoardLayout;
use crate::ledger::ActionLedger;
use crate::phase::SessionStateMachine;
use crate::player::Player;
use crate::resources::ResourceLedger;
use crate::rng::GameRng;
use crate::route_graph::RouteGraph;
use crate::Rejection;

use super::state::{BankTrade, Offer, SessionState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResumeError {
    #[error("snapshot has no players")]
    NoPlayers,
    #[error("snapshot has {0} players, more than there are seats")]
    TooManyPlayers(usize),
    #[error("player at index {index} has seat {seat}")]
    SeatMismatch { index: usize, seat: PlayerId },
    #[error("unknown seat {0}")]
    UnknownSeat(PlayerId),
    #[error("cannot place {piece} at {at}: {reason}")]
    Piece {
        piece: PieceKind,
        at: Coord,
        reason: Rejection,
    },
    #[error("closed route at {0} is not a ship")]
    ClosedWithoutShip(Coord),
    #[error("robber at {0} is not a land hex")]
    Robber(Coord),
}

fn picks(map: &BTreeMap<PlayerId, u32>) -> Vec<PendingPick> {
    map.iter()
        .map(|(player, count)| PendingPick {
            player: *player,
            count: *count,
        })
        .collect()
}

impl SessionState {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            turn: self.machine.turn(),
            current_player: self.machine.current_player(),
            phase: self.machine.phase(),
            robber_return: self.machine.robber_return(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    resources: self.resources.hand(p.id),
                    dev_cards: p.dev_cards.clone(),
                    new_dev_cards: p.new_dev_cards.clone(),
                    knights: p.knights,
                    played_dev_card: p.played_dev_card,
                    asked_special_build: p.asked_special_build,
                    public_score: p.public_score(&self.graph, self.largest_army),
                })
                .collect(),
            pieces: self
                .graph
                .pieces()
                .map(|(at, owner, piece)| PieceSnapshot { owner, piece, at })
                .collect(),
            closed_routes: self.graph.closed_edges().collect(),
            longest_route_holder: self.graph.holder(),
            largest_army_holder: self.largest_army,
            robber: self.robber,
            pirate: self.pirate,
            deck: self.deck.clone(),
            pending_discards: picks(&self.pending_discards),
            pending_gold_picks: picks(&self.pending_gold),
            offers: self
                .offers
                .iter()
                .map(|(from, o)| OfferSnapshot {
                    from: *from,
                    to: o.to.clone(),
                    give: o.give,
                    get: o.get,
                })
                .collect(),
            last_bank_trade: self.last_bank_trade.map(|t| BankTradeSnapshot {
                player: t.player,
                give: t.give,
                get: t.get,
            }),
            ships_placed_this_turn: self.ships_placed_this_turn.iter().copied().collect(),
            moved_ship_this_turn: self.moved_ship_this_turn,
            special_build_after: self.machine.special_build_after(),
            rng_state: self.rng.state_bytes(),
        }
    }

    /// Rebuild state from a snapshot. The action history starts empty.
    pub fn resume(snapshot: &SessionSnapshot, layout: &BoardLayout) -> Result<Self, ResumeError> {
        if snapshot.players.is_empty() {
            return Err(ResumeError::NoPlayers);
        }
        let seats = snapshot.players.len();
        let seat_count = u8::try_from(seats).map_err(|_| ResumeError::TooManyPlayers(seats))?;
        let known = |seat: PlayerId| {
            if seat.index() < seats {
                Ok(seat)
            } else {
                Err(ResumeError::UnknownSeat(seat))
            }
        };

        let mut players = Vec::with_capacity(seats);
        let mut hands = Vec::with_capacity(seats);
        for (index, p) in snapshot.players.iter().enumerate() {
            if p.id.index() != index {
                return Err(ResumeError::SeatMismatch { index, seat: p.id });
            }
            players.push(Player {
                id: p.id,
                name: p.name.clone(),
                dev_cards: p.dev_cards.clone(),
                new_dev_cards: p.new_dev_cards.clone(),
                knights: p.knights,
                played_dev_card: p.played_dev_card,
                asked_special_build: p.asked_special_build,
            });
            hands.push(p.resources);
        }

        let mut graph = RouteGraph::new();
        for piece in &snapshot.pieces {
            let owner = known(piece.owner)?;
            let placed = match piece.piece {
                PieceKind::City => graph
                    .add_piece(owner, PieceKind::Settlement, piece.at)
                    .and_then(|()| graph.add_piece(owner, PieceKind::City, piece.at)),
                kind => graph.add_piece(owner, kind, piece.at),
            };
            placed.map_err(|reason| ResumeError::Piece {
                piece: piece.piece,
                at: piece.at,
                reason,
            })?;
        }
        for edge in &snapshot.closed_routes {
            if !matches!(graph.piece_at(*edge), Some((_, PieceKind::Ship))) {
                return Err(ResumeError::ClosedWithoutShip(*edge));
            }
        }
        graph.close(&snapshot.closed_routes);
        if let Some(holder) = snapshot.longest_route_holder {
            known(holder)?;
        }
        graph.set_holder(snapshot.longest_route_holder);
        if let Some(holder) = snapshot.largest_army_holder {
            known(holder)?;
        }
        for edge in &snapshot.ships_placed_this_turn {
            if !matches!(graph.piece_at(*edge), Some((_, PieceKind::Ship))) {
                return Err(ResumeError::Piece {
                    piece: PieceKind::Ship,
                    at: *edge,
                    reason: Rejection::IllegalPlacement,
                });
            }
        }
        let special_after = snapshot.special_build_after.map(known).transpose()?;
        if !layout.is_land_hex(snapshot.robber) {
            return Err(ResumeError::Robber(snapshot.robber));
        }

        let collect_picks = |list: &[PendingPick]| -> Result<BTreeMap<PlayerId, u32>, ResumeError> {
            list.iter()
                .map(|p| known(p.player).map(|seat| (seat, p.count)))
                .collect()
        };
        let offers = snapshot
            .offers
            .iter()
            .map(|o| {
                known(o.from).map(|from| {
                    (
                        from,
                        Offer {
                            to: o.to.clone(),
                            give: o.give,
                            get: o.get,
                        },
                    )
                })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self {
            players,
            resources: ResourceLedger::from_hands(hands),
            graph,
            ledger: ActionLedger::new(),
            machine: SessionStateMachine::resume(
                seat_count,
                snapshot.phase,
                known(snapshot.current_player)?,
                snapshot.turn,
                snapshot.robber_return,
            )
            .with_special_build(special_after),
            largest_army: snapshot.largest_army_holder,
            deck: snapshot.deck.clone(),
            rng: GameRng::from_state_bytes(snapshot.rng_state),
            robber: snapshot.robber,
            pirate: snapshot.pirate,
            pending_discards: collect_picks(&snapshot.pending_discards)?,
            pending_gold: collect_picks(&snapshot.pending_gold_picks)?,
            offers,
            last_bank_trade: snapshot.last_bank_trade.map(|t| BankTrade {
                player: t.player,
                give: t.give,
                get: t.get,
            }),
            ships_placed_this_turn: snapshot.ships_placed_this_turn.iter().copied().collect(),
            moved_ship_this_turn: snapshot.moved_ship_this_turn,
        })
    }
}

/// What `viewer` may know of a full snapshot. `None` is a non-seated observer.
///
/// Other players' hands and cards become unknown, the deck order is hidden and the rng state is
/// zeroed so future steals and draws cannot be predicted.
pub fn redact_snapshot(snapshot: &SessionSnapshot, viewer: Option<PlayerId>) -> SessionSnapshot {
    let mut snap = snapshot.clone();
    for p in snap.players.iter_mut() {
        if Some(p.id) == viewer {
            continue;
        }
        p.resources = p.resources.redacted();
        p.dev_cards.fill(DevCardKind::Unknown);
        p.new_dev_cards.fill(DevCardKind::Unknown);
    }
    snap.deck.fill(DevCardKind::Unknown);
    snap.rng_state = [0; 32];
    snap
}
