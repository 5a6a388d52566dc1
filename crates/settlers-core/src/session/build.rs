//! Building, moving ships and undoing either.

use settlers_protocol::{
    Coord, ElementAction, Event, Phase, PieceKind, PlayerElementKind, PlayerId,
};

use crate::ledger::{Action, ActionKind, Effect, EffectTarget};
use crate::resources::Purchase;
use crate::visibility::ScopedEvent;
use crate::Rejection;

use super::state::{Rules, SessionState};

impl SessionState {
    pub(super) fn request_build(
        &mut self,
        player: PlayerId,
        piece: PieceKind,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        if !self
            .resources
            .can_afford(player, &Purchase::piece(piece).cost())
        {
            return Err(Rejection::InsufficientResources);
        }
        if self.pieces_left(player, piece) == 0 {
            return Err(Rejection::IllegalPlacement);
        }
        self.set_phase(Phase::placing(piece), out);
        Ok(Action::new(ActionKind::RequestBuild { piece }, player))
    }

    pub(super) fn cancel_build(
        &mut self,
        player: PlayerId,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        self.set_phase(self.machine.build_home(), out);
        Ok(Action::new(ActionKind::CancelBuild, player))
    }

    /// Ask to build between the current turn and the next.
    pub(super) fn ask_special_build(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        if !rules.options.special_building || player == self.machine.current_player() {
            return Err(Rejection::InvalidChoice);
        }
        let seat = self.player_mut(player)?;
        if seat.asked_special_build {
            return Err(Rejection::InvalidChoice);
        }
        seat.asked_special_build = true;
        out.push(ScopedEvent::all(Event::PlayerElement {
            player,
            action: ElementAction::Set,
            element: PlayerElementKind::AskedSpecialBuild,
            amount: 1,
            news: false,
        }));
        Ok(Action::new(ActionKind::AskSpecialBuild, player))
    }

    pub(super) fn build(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let phase = self.machine.phase();
        let free = phase.is_free_placement();
        if free && !piece.is_linear() {
            return Err(Rejection::InvalidChoice);
        }
        if phase.placing_piece().is_some_and(|p| p != piece) {
            return Err(Rejection::InvalidChoice);
        }
        if self.pieces_left(player, piece) == 0 {
            return Err(Rejection::IllegalPlacement);
        }
        let cost = Purchase::piece(piece).cost();
        if !free && !self.resources.can_afford(player, &cost) {
            return Err(Rejection::InsufficientResources);
        }
        if !rules
            .placement
            .can_place(self.view(rules.layout), player, piece, at)
        {
            return Err(Rejection::IllegalPlacement);
        }

        let mut action = Action::new(ActionKind::BuildPiece { piece, at }, player);
        action.undoable = !free;

        self.graph.add_piece(player, piece, at)?;
        if piece == PieceKind::Ship {
            self.ships_placed_this_turn.insert(at);
        }
        if matches!(piece, PieceKind::Settlement | PieceKind::Ship) {
            let edges = self.graph.closing_ships(player, at);
            if !edges.is_empty() {
                self.record(&mut action, Effect::CloseRoute { player, edges })?;
            }
        }
        if !free {
            self.record(&mut action, Effect::DeductCost { player, cost })?;
        }
        let route_changed = self.update_longest_route(&mut action)?;

        if !free {
            out.push(ScopedEvent::all(Event::PlayerElements {
                player,
                action: ElementAction::Lose,
                resources: cost,
            }));
        }
        out.push(ScopedEvent::all(Event::Text {
            text: format!("{} built a {piece}.", self.name(player)),
        }));
        out.push(ScopedEvent::all(Event::PutPiece { player, piece, at }));
        if route_changed {
            out.push(ScopedEvent::all(Event::LongestRoute {
                holder: self.graph.holder(),
            }));
        }

        let next = match phase {
            Phase::PlacingFreeRoad1
                if self.pieces_left(player, PieceKind::Road)
                    + self.pieces_left(player, PieceKind::Ship)
                    > 0 =>
            {
                Phase::PlacingFreeRoad2
            }
            _ => self.machine.build_home(),
        };
        self.set_phase(next, out);
        self.check_win(rules, out);
        Ok(action)
    }

    pub(super) fn move_piece(
        &mut self,
        rules: Rules<'_>,
        player: PlayerId,
        piece: PieceKind,
        from: Coord,
        to: Coord,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        // One move per turn, and never a ship built this turn.
        if self.moved_ship_this_turn || self.ships_placed_this_turn.contains(&from) {
            return Err(Rejection::IllegalPlacement);
        }
        if !rules
            .placement
            .can_move(self.view(rules.layout), player, piece, from, to)
        {
            return Err(Rejection::IllegalPlacement);
        }

        let mut action = Action::new(ActionKind::MovePiece { piece, from, to }, player);
        self.graph.move_piece(from, to)?;
        self.moved_ship_this_turn = true;
        let edges = self.graph.closing_ships(player, to);
        let closes = !edges.is_empty();
        if closes {
            self.record(&mut action, Effect::CloseRoute { player, edges })?;
        }
        let route_changed = self.update_longest_route(&mut action)?;
        action.undoable = !closes;

        out.push(ScopedEvent::all(Event::MovePiece {
            player,
            piece,
            from,
            to,
        }));
        if route_changed {
            out.push(ScopedEvent::all(Event::LongestRoute {
                holder: self.graph.holder(),
            }));
        }
        self.check_win(rules, out);
        Ok(action)
    }

    /// Undo the last build or ship move. The parameters must name that action exactly.
    pub(super) fn undo(
        &mut self,
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
        moved_from: Coord,
        out: &mut Vec<ScopedEvent>,
    ) -> Result<Action, Rejection> {
        let last = self
            .ledger
            .undoable_by(player, |kind| match kind {
                ActionKind::BuildPiece { piece: p, at: a } => {
                    *p == piece && *a == at && moved_from == Coord::NONE
                }
                ActionKind::MovePiece { piece: p, from, to } => {
                    *p == piece && *to == at && *from == moved_from
                }
                _ => false,
            })?
            .clone();

        match last.kind {
            ActionKind::BuildPiece {
                piece: PieceKind::City,
                at,
            } => {
                self.graph.remove_piece(at);
                self.graph.add_piece(player, PieceKind::Settlement, at)?;
            }
            ActionKind::BuildPiece { at, .. } => {
                self.graph.remove_piece(at);
                self.ships_placed_this_turn.remove(&at);
            }
            ActionKind::MovePiece { from, to, .. } => {
                self.graph.move_piece(to, from)?;
                self.moved_ship_this_turn = false;
            }
            _ => return Err(Rejection::NotUndoable),
        }

        let mut target = EffectTarget {
            resources: &mut self.resources,
            graph: &mut self.graph,
            largest_army: &mut self.largest_army,
        };
        let undone = self.ledger.undo_last(&mut target)?;

        out.push(ScopedEvent::all(Event::UndoPutPiece {
            player,
            piece,
            at,
            moved_from,
        }));
        for effect in &undone.effects {
            if let Effect::DeductCost { player, cost } = effect {
                out.push(ScopedEvent::all(Event::PlayerElements {
                    player: *player,
                    action: ElementAction::Gain,
                    resources: *cost,
                }));
            }
        }
        out.push(ScopedEvent::all(Event::LongestRoute {
            holder: self.graph.holder(),
        }));

        self.ledger.last().cloned().ok_or(Rejection::NotUndoable)
    }
}
