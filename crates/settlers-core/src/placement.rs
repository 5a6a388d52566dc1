//! Piece placement legality, consulted as a capability by the session.

use std::fmt;

use settlers_protocol::{Coord, PieceKind, PlayerId};

use crate::layout::{geometry, BoardLayout};
use crate::route_graph::RouteGraph;

/// Read-only view of the board handed to placement rules.
#[derive(Clone, Copy, Debug)]
pub struct BoardView<'a> {
    pub layout: &'a BoardLayout,
    pub graph: &'a RouteGraph,
}

/// "Can this placement be legally made?"
pub trait Placement: fmt::Debug + Send + Sync {
    fn can_place(&self, board: BoardView<'_>, player: PlayerId, piece: PieceKind, at: Coord)
        -> bool;

    fn can_move(
        &self,
        board: BoardView<'_>,
        player: PlayerId,
        piece: PieceKind,
        from: Coord,
        to: Coord,
    ) -> bool;
}

/// Base-game placement rules with sea routes.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardPlacement;

impl StandardPlacement {
    /// `at` touches an own building, or an own piece of the same kind through a node not held by
    /// an opponent. `skip` is ignored as a connection (the piece being moved).
    fn connects(
        graph: &RouteGraph,
        player: PlayerId,
        kind: PieceKind,
        at: Coord,
        skip: Coord,
    ) -> bool {
        geometry::edge_nodes(at)
            .into_iter()
            .any(|node| match graph.node_owner(node) {
                Some(owner) => owner == player,
                None => graph
                    .linear_at(player, node, at)
                    .any(|(e, k)| e != skip && k == kind),
            })
    }

    fn settlement_ok(board: BoardView<'_>, player: PlayerId, at: Coord) -> bool {
        at.is_node()
            && board.layout.is_land_node(at)
            && board.graph.piece_at(at).is_none()
            && geometry::node_neighbors(at)
                .into_iter()
                .all(|n| board.graph.node_owner(n).is_none())
            && board.graph.touches_route(player, at)
    }

    fn linear_ok(
        board: BoardView<'_>,
        player: PlayerId,
        kind: PieceKind,
        at: Coord,
        skip: Coord,
    ) -> bool {
        at.is_edge()
            && board.layout.edge_allows(kind, at)
            && board.graph.piece_at(at).is_none()
            && Self::connects(board.graph, player, kind, at, skip)
    }

    /// An open ship with at least one end that nothing of the owner continues from.
    fn ship_movable(graph: &RouteGraph, player: PlayerId, from: Coord) -> bool {
        if graph.piece_at(from) != Some((player, PieceKind::Ship)) || graph.is_closed(from) {
            return false;
        }
        geometry::edge_nodes(from).into_iter().any(|node| {
            graph.node_owner(node) != Some(player)
                && graph.linear_at(player, node, from).next().is_none()
        })
    }
}

impl Placement for StandardPlacement {
    fn can_place(
        &self,
        board: BoardView<'_>,
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
    ) -> bool {
        match piece {
            PieceKind::Settlement => Self::settlement_ok(board, player, at),
            PieceKind::City => board.graph.piece_at(at) == Some((player, PieceKind::Settlement)),
            PieceKind::Road | PieceKind::Ship => {
                Self::linear_ok(board, player, piece, at, Coord::NONE)
            }
        }
    }

    fn can_move(
        &self,
        board: BoardView<'_>,
        player: PlayerId,
        piece: PieceKind,
        from: Coord,
        to: Coord,
    ) -> bool {
        piece == PieceKind::Ship
            && from != to
            && Self::ship_movable(board.graph, player, from)
            && Self::linear_ok(board, player, piece, to, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{load_layout, LayoutSource};
    use settlers_protocol::{Corner, Side};

    fn layout() -> BoardLayout {
        load_layout(LayoutSource::Embedded).unwrap()
    }

    #[test]
    fn settlement_needs_route_and_distance() {
        let layout = layout();
        let mut graph = RouteGraph::new();
        let p = PlayerId(0);
        let home = Coord::node(0, 0, Corner::North);
        graph.add_piece(p, PieceKind::Settlement, home).unwrap();
        let road1 = Coord::edge(0, 0, Side::NorthEast);
        let road2 = Coord::edge(0, 0, Side::East);
        graph.add_piece(p, PieceKind::Road, road1).unwrap();

        let rules = StandardPlacement;
        let view = BoardView {
            layout: &layout,
            graph: &graph,
        };
        // one edge away from home: too close
        let near = Coord::node(1, -1, Corner::South);
        assert!(!rules.can_place(view, p, PieceKind::Settlement, near));
        // two edges away but no route there yet
        let far = Coord::node(0, 1, Corner::North);
        assert!(!rules.can_place(view, p, PieceKind::Settlement, far));

        graph.add_piece(p, PieceKind::Road, road2).unwrap();
        let view = BoardView {
            layout: &layout,
            graph: &graph,
        };
        assert!(rules.can_place(view, p, PieceKind::Settlement, far));
        assert!(!rules.can_place(view, PlayerId(1), PieceKind::Settlement, far));
    }

    #[test]
    fn roads_do_not_extend_through_opponents() {
        let layout = layout();
        let mut graph = RouteGraph::new();
        let p = PlayerId(0);
        graph
            .add_piece(p, PieceKind::Road, Coord::edge(0, 0, Side::NorthEast))
            .unwrap();
        // far end of that road is S(1,-1); an opponent settles there
        graph
            .add_piece(PlayerId(1), PieceKind::Settlement, Coord::node(1, -1, Corner::South))
            .unwrap();
        let view = BoardView {
            layout: &layout,
            graph: &graph,
        };
        assert!(!StandardPlacement.can_place(view, p, PieceKind::Road, Coord::edge(0, 0, Side::East)));
        // the near end is still open
        assert!(StandardPlacement.can_place(
            view,
            p,
            PieceKind::Road,
            Coord::edge(0, -1, Side::SouthEast)
        ));
    }

    #[test]
    fn ships_move_from_route_ends_only() {
        let layout = layout();
        let mut graph = RouteGraph::new();
        let p = PlayerId(0);
        let home = Coord::node(2, -1, Corner::South);
        let first = Coord::edge(2, -1, Side::SouthEast);
        let second = Coord::edge(2, 0, Side::NorthEast);
        let elsewhere = Coord::edge(2, -1, Side::East);
        graph.add_piece(p, PieceKind::Settlement, home).unwrap();
        graph.add_piece(p, PieceKind::Ship, first).unwrap();
        graph.add_piece(p, PieceKind::Ship, second).unwrap();
        let view = BoardView {
            layout: &layout,
            graph: &graph,
        };

        // first is sandwiched between home and second
        assert!(!StandardPlacement.can_move(view, p, PieceKind::Ship, first, elsewhere));
        assert!(StandardPlacement.can_move(view, p, PieceKind::Ship, second, elsewhere));
        assert!(!StandardPlacement.can_move(view, p, PieceKind::Road, second, elsewhere));

        graph.close(&[second]);
        let view = BoardView {
            layout: &layout,
            graph: &graph,
        };
        assert!(!StandardPlacement.can_move(view, p, PieceKind::Ship, second, elsewhere));
    }
}
