//! The action ledger: applied actions, their effects, and undo.

use serde::{Deserialize, Serialize};
use settlers_protocol::{Coord, DevCardKind, PieceKind, PlayerId, ResourceKind, ResourceSet};

use crate::resources::ResourceLedger;
use crate::route_graph::RouteGraph;
use crate::Rejection;

/// One atomic, invertible consequence of an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Build or purchase cost taken from `player`. Inverse: refund.
    DeductCost { player: PlayerId, cost: ResourceSet },
    /// Longest-route title moved. Inverse: give it back to `from`.
    ChangeLongestRoute {
        from: Option<PlayerId>,
        to: Option<PlayerId>,
    },
    /// Ships that became part of a closed sea route. Inverse: reopen exactly these edges.
    CloseRoute { player: PlayerId, edges: Vec<Coord> },
    /// Largest-army title moved. Inverse: give it back to `from`.
    ChangeLargestArmy {
        from: Option<PlayerId>,
        to: Option<PlayerId>,
    },
}

/// Mutable session parts that effects act on.
pub struct EffectTarget<'a> {
    pub resources: &'a mut ResourceLedger,
    pub graph: &'a mut RouteGraph,
    pub largest_army: &'a mut Option<PlayerId>,
}

impl Effect {
    pub fn apply(&self, target: &mut EffectTarget<'_>) -> Result<(), Rejection> {
        match self {
            Effect::DeductCost { player, cost } => target.resources.lose(*player, cost)?,
            Effect::ChangeLongestRoute { to, .. } => target.graph.set_holder(*to),
            Effect::CloseRoute { edges, .. } => target.graph.close(edges),
            Effect::ChangeLargestArmy { to, .. } => *target.largest_army = *to,
        }
        Ok(())
    }

    pub fn revert(&self, target: &mut EffectTarget<'_>) {
        match self {
            Effect::DeductCost { player, cost } => target.resources.gain(*player, cost),
            Effect::ChangeLongestRoute { from, .. } => target.graph.set_holder(*from),
            Effect::CloseRoute { edges, .. } => target.graph.reopen(edges),
            Effect::ChangeLargestArmy { from, .. } => *target.largest_army = *from,
        }
    }
}

/// What an action did. Closed set; every command that changes game state maps to one kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    BuildPiece { piece: PieceKind, at: Coord },
    MovePiece { piece: PieceKind, from: Coord, to: Coord },
    UndoBuildPiece { piece: PieceKind, at: Coord },
    UndoMovePiece { piece: PieceKind, from: Coord, to: Coord },
    RequestBuild { piece: PieceKind },
    CancelBuild,
    AskSpecialBuild,
    RollDice { dice: [u8; 2] },
    EndTurn,
    BuyDevCard,
    PlayDevCard { card: DevCardKind },
    Monopoly { resource: ResourceKind },
    PickResources { resources: ResourceSet },
    Discard { resources: ResourceSet },
    ChooseRobberOrPirate { pirate: bool },
    MoveRobber { hex: Coord, pirate: bool },
    BankTrade { give: ResourceSet, get: ResourceSet },
    AcceptOffer { from: PlayerId },
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::BuildPiece { .. } => "BUILD_PIECE",
            ActionKind::MovePiece { .. } => "MOVE_PIECE",
            ActionKind::UndoBuildPiece { .. } => "UNDO_BUILD_PIECE",
            ActionKind::UndoMovePiece { .. } => "UNDO_MOVE_PIECE",
            ActionKind::RequestBuild { .. } => "REQUEST_BUILD",
            ActionKind::CancelBuild => "CANCEL_BUILD",
            ActionKind::AskSpecialBuild => "ASK_SPECIAL_BUILD",
            ActionKind::RollDice { .. } => "ROLL_DICE",
            ActionKind::EndTurn => "END_TURN",
            ActionKind::BuyDevCard => "BUY_DEV_CARD",
            ActionKind::PlayDevCard { .. } => "PLAY_DEV_CARD",
            ActionKind::Monopoly { .. } => "MONOPOLY",
            ActionKind::PickResources { .. } => "PICK_RESOURCES",
            ActionKind::Discard { .. } => "DISCARD",
            ActionKind::ChooseRobberOrPirate { .. } => "CHOOSE_ROBBER_OR_PIRATE",
            ActionKind::MoveRobber { .. } => "MOVE_ROBBER",
            ActionKind::BankTrade { .. } => "BANK_TRADE",
            ActionKind::AcceptOffer { .. } => "ACCEPT_OFFER",
        }
    }
}

/// One applied command with its recorded effects. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub player: PlayerId,
    pub undoable: bool,
    pub effects: Vec<Effect>,
}

impl Action {
    pub fn new(kind: ActionKind, player: PlayerId) -> Self {
        Self {
            kind,
            player,
            undoable: false,
            effects: Vec::new(),
        }
    }

    /// Up to three positional parameters, as reproduced on the wire.
    pub fn params(&self) -> [i64; 3] {
        let coord = |c: &Coord| i64::from(c.0);
        match &self.kind {
            ActionKind::BuildPiece { piece, at } => {
                [i64::from(piece.code()), coord(at), i64::from(self.player.0)]
            }
            ActionKind::MovePiece { piece, from, to }
            | ActionKind::UndoMovePiece { piece, from, to } => {
                [i64::from(piece.code()), coord(from), coord(to)]
            }
            ActionKind::UndoBuildPiece { piece, at } => [i64::from(piece.code()), coord(at), 0],
            ActionKind::RequestBuild { piece } => [i64::from(piece.code()), 0, 0],
            ActionKind::RollDice { dice } => [i64::from(dice[0] + dice[1]), 0, 0],
            ActionKind::PlayDevCard { card } => [i64::from(card.code()), 0, 0],
            ActionKind::Monopoly { resource } => [i64::from(resource.code()), 0, 0],
            ActionKind::MoveRobber { hex, pirate } => [coord(hex), i64::from(*pirate), 0],
            ActionKind::ChooseRobberOrPirate { pirate } => [i64::from(*pirate), 0, 0],
            ActionKind::AcceptOffer { from } => [i64::from(from.0), 0, 0],
            ActionKind::CancelBuild
            | ActionKind::AskSpecialBuild
            | ActionKind::EndTurn
            | ActionKind::BuyDevCard
            | ActionKind::PickResources { .. }
            | ActionKind::Discard { .. }
            | ActionKind::BankTrade { .. } => [0, 0, 0],
        }
    }

    /// The undo-flavoured counterpart of an undoable action, carrying the same effects.
    fn undo_counterpart(&self) -> Option<Action> {
        let kind = match &self.kind {
            ActionKind::BuildPiece { piece, at } => ActionKind::UndoBuildPiece {
                piece: *piece,
                at: *at,
            },
            ActionKind::MovePiece { piece, from, to } => ActionKind::UndoMovePiece {
                piece: *piece,
                from: *from,
                to: *to,
            },
            _ => return None,
        };
        Some(Action {
            kind,
            player: self.player,
            undoable: false,
            effects: self.effects.clone(),
        })
    }
}

/// The session's current action: the last one applied, which is all undo ever looks at.
/// Earlier actions live on only in the event log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionLedger {
    current: Option<Action>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `action` as the current one, replacing its predecessor.
    pub fn append(&mut self, action: Action) {
        self.current = Some(action);
    }

    /// The current/last action.
    pub fn last(&self) -> Option<&Action> {
        self.current.as_ref()
    }

    /// The last action, if `player` may undo it and `matches` accepts its kind.
    pub fn undoable_by(
        &self,
        player: PlayerId,
        matches: impl FnOnce(&ActionKind) -> bool,
    ) -> Result<&Action, Rejection> {
        match &self.current {
            Some(action) if action.undoable && action.player == player && matches(&action.kind) => {
                Ok(action)
            }
            _ => Err(Rejection::NotUndoable),
        }
    }

    /// Revert the last action's effects in reverse order and replace it with its undo
    /// counterpart. Returns the reverted action.
    ///
    /// Callers check [`ActionLedger::undoable_by`] first; piece placement is reverted by the
    /// caller.
    pub fn undo_last(&mut self, target: &mut EffectTarget<'_>) -> Result<Action, Rejection> {
        let counterpart = match &self.current {
            Some(action) if action.undoable => action
                .undo_counterpart()
                .ok_or(Rejection::NotUndoable)?,
            _ => return Err(Rejection::NotUndoable),
        };
        let Some(action) = self.current.replace(counterpart) else {
            return Err(Rejection::NotUndoable);
        };
        for effect in action.effects.iter().rev() {
            effect.revert(target);
        }
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlers_protocol::Corner;

    fn build_action(player: PlayerId) -> Action {
        Action {
            kind: ActionKind::BuildPiece {
                piece: PieceKind::Settlement,
                at: Coord::node(0, 0, Corner::North),
            },
            player,
            undoable: true,
            effects: vec![
                Effect::DeductCost {
                    player,
                    cost: ResourceSet::new(1, 0, 1, 1, 1),
                },
                Effect::ChangeLongestRoute {
                    from: Some(PlayerId(1)),
                    to: Some(player),
                },
            ],
        }
    }

    #[test]
    fn undo_reverts_effects_and_appends_counterpart() {
        let p = PlayerId(0);
        let mut resources = ResourceLedger::new(2);
        resources.set(p, ResourceSet::new(1, 0, 1, 1, 1));
        let mut graph = RouteGraph::new();
        graph.set_holder(Some(PlayerId(1)));
        let mut army = None;

        let action = build_action(p);
        let mut ledger = ActionLedger::new();
        {
            let mut target = EffectTarget {
                resources: &mut resources,
                graph: &mut graph,
                largest_army: &mut army,
            };
            for effect in &action.effects {
                effect.apply(&mut target).unwrap();
            }
        }
        ledger.append(action.clone());
        assert_eq!(resources.hand(p), ResourceSet::default());
        assert_eq!(graph.holder(), Some(p));

        assert!(ledger.undoable_by(PlayerId(1), |_| true).is_err());
        assert!(ledger.undoable_by(p, |_| true).is_ok());

        let mut target = EffectTarget {
            resources: &mut resources,
            graph: &mut graph,
            largest_army: &mut army,
        };
        let undone = ledger.undo_last(&mut target).unwrap();
        assert_eq!(undone, action);
        assert_eq!(resources.hand(p), ResourceSet::new(1, 0, 1, 1, 1));
        assert_eq!(graph.holder(), Some(PlayerId(1)));

        let last = ledger.last().unwrap();
        assert!(matches!(last.kind, ActionKind::UndoBuildPiece { .. }));
        assert_eq!(last.effects, action.effects);
        assert!(!last.undoable);
    }

    #[test]
    fn undo_is_not_repeatable() {
        let p = PlayerId(0);
        let mut resources = ResourceLedger::new(1);
        let mut graph = RouteGraph::new();
        let mut army = None;
        let mut ledger = ActionLedger::new();
        ledger.append(build_action(p));
        let mut target = EffectTarget {
            resources: &mut resources,
            graph: &mut graph,
            largest_army: &mut army,
        };
        ledger.undo_last(&mut target).unwrap();
        assert_eq!(ledger.undo_last(&mut target), Err(Rejection::NotUndoable));
    }

    #[test]
    fn only_the_current_action_is_kept() {
        let mut ledger = ActionLedger::new();
        assert!(ledger.last().is_none());
        ledger.append(build_action(PlayerId(0)));
        ledger.append(Action::new(ActionKind::EndTurn, PlayerId(0)));
        assert_eq!(ledger.last().map(|a| &a.kind), Some(&ActionKind::EndTurn));
        // the build is gone, so there is nothing left to undo
        assert_eq!(
            ledger.undoable_by(PlayerId(0), |_| true).err(),
            Some(Rejection::NotUndoable)
        );
    }

    #[test]
    fn build_params_are_piece_coord_player() {
        let action = build_action(PlayerId(3));
        let [piece, at, player] = action.params();
        assert_eq!(piece, 1);
        assert_eq!(at, i64::from(Coord::node(0, 0, Corner::North).0));
        assert_eq!(player, 3);
    }
}
