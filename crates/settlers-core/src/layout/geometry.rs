//! Node/edge/hex incidence on the pointy-top axial grid.
//!
//! Every node is the north or south corner of exactly one hex and every edge is the north-east,
//! east or south-east side of exactly one hex; the remaining corners and sides of a hex are
//! named after its neighbours. All functions return an empty list for coordinates of the wrong
//! site kind.

use settlers_protocol::{Coord, Corner, Hex, Side, Site};

fn node(h: Hex, corner: Corner) -> Coord {
    Coord::node(h.q, h.r, corner)
}

fn edge(h: Hex, side: Side) -> Coord {
    Coord::edge(h.q, h.r, side)
}

/// The three hexes around a node.
pub fn node_hexes(at: Coord) -> Vec<Hex> {
    match at.site() {
        Some(Site::Node(h, Corner::North)) => vec![h, h.offset(0, -1), h.offset(1, -1)],
        Some(Site::Node(h, Corner::South)) => vec![h, h.offset(-1, 1), h.offset(0, 1)],
        _ => Vec::new(),
    }
}

/// The three edges meeting at a node.
pub fn node_edges(at: Coord) -> Vec<Coord> {
    match at.site() {
        Some(Site::Node(h, Corner::North)) => vec![
            edge(h, Side::NorthEast),
            edge(h.offset(0, -1), Side::SouthEast),
            edge(h.offset(0, -1), Side::East),
        ],
        Some(Site::Node(h, Corner::South)) => vec![
            edge(h, Side::SouthEast),
            edge(h.offset(-1, 1), Side::NorthEast),
            edge(h.offset(-1, 1), Side::East),
        ],
        _ => Vec::new(),
    }
}

/// The two end nodes of an edge.
pub fn edge_nodes(at: Coord) -> Vec<Coord> {
    match at.site() {
        Some(Site::Edge(h, Side::NorthEast)) => {
            vec![node(h, Corner::North), node(h.offset(1, -1), Corner::South)]
        }
        Some(Site::Edge(h, Side::East)) => vec![
            node(h.offset(1, -1), Corner::South),
            node(h.offset(0, 1), Corner::North),
        ],
        Some(Site::Edge(h, Side::SouthEast)) => {
            vec![node(h.offset(0, 1), Corner::North), node(h, Corner::South)]
        }
        _ => Vec::new(),
    }
}

/// The two hexes on either side of an edge.
pub fn edge_hexes(at: Coord) -> Vec<Hex> {
    match at.site() {
        Some(Site::Edge(h, Side::NorthEast)) => vec![h, h.offset(1, -1)],
        Some(Site::Edge(h, Side::East)) => vec![h, h.offset(1, 0)],
        Some(Site::Edge(h, Side::SouthEast)) => vec![h, h.offset(0, 1)],
        _ => Vec::new(),
    }
}

/// Nodes one edge away.
pub fn node_neighbors(at: Coord) -> Vec<Coord> {
    node_edges(at)
        .into_iter()
        .filter_map(|e| edge_nodes(e).into_iter().find(|n| *n != at))
        .collect()
}

/// The other end of `edge` seen from `from`.
pub fn other_end(edge: Coord, from: Coord) -> Option<Coord> {
    let ends = edge_nodes(edge);
    match ends.as_slice() {
        [a, b] if *a == from => Some(*b),
        [a, b] if *b == from => Some(*a),
        _ => None,
    }
}

/// The six corners of a hex, clockwise from the top.
pub fn hex_corners(h: Hex) -> [Coord; 6] {
    [
        node(h, Corner::North),
        node(h.offset(1, -1), Corner::South),
        node(h.offset(0, 1), Corner::North),
        node(h, Corner::South),
        node(h.offset(-1, 1), Corner::North),
        node(h.offset(0, -1), Corner::South),
    ]
}

/// The six sides of a hex, clockwise from the north-east side.
pub fn hex_edges(h: Hex) -> [Coord; 6] {
    [
        edge(h, Side::NorthEast),
        edge(h, Side::East),
        edge(h, Side::SouthEast),
        edge(h.offset(-1, 1), Side::NorthEast),
        edge(h.offset(-1, 0), Side::East),
        edge(h.offset(0, -1), Side::SouthEast),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incidence_is_symmetric() {
        let h = Hex::new(0, 0);
        for corner in hex_corners(h) {
            assert!(node_hexes(corner).contains(&h), "{corner:?} misses its hex");
            for e in node_edges(corner) {
                assert!(edge_nodes(e).contains(&corner), "{e:?} does not end at {corner:?}");
            }
        }
        for side in hex_edges(h) {
            assert!(edge_hexes(side).contains(&h), "{side:?} does not border {h:?}");
        }
    }

    #[test]
    fn hex_perimeter_is_a_closed_walk() {
        let h = Hex::new(1, -1);
        let corners = hex_corners(h);
        let edges = hex_edges(h);
        for (i, e) in edges.iter().enumerate() {
            let ends = edge_nodes(*e);
            assert!(ends.contains(&corners[i]));
            assert!(ends.contains(&corners[(i + 1) % 6]));
        }
    }

    #[test]
    fn neighbours_are_distinct() {
        let n = Coord::node(0, 0, Corner::South);
        let mut around = node_neighbors(n);
        around.sort();
        around.dedup();
        assert_eq!(around.len(), 3);
        assert!(!around.contains(&n));
    }

    #[test]
    fn wrong_site_kind_yields_nothing() {
        assert!(node_edges(Coord::hex(0, 0)).is_empty());
        assert!(edge_nodes(Coord::node(0, 0, Corner::North)).is_empty());
        assert_eq!(other_end(Coord::edge(0, 0, Side::East), Coord::hex(0, 0)), None);
    }
}
