use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Axial coordinates for a pointy-top hex grid (q, r). The implicit cube coordinate is `s = -q - r`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const DIRECTIONS: [Hex; 6] = [
        Hex { q: 1, r: 0 },  // East
        Hex { q: 1, r: -1 }, // Northeast
        Hex { q: 0, r: -1 }, // Northwest
        Hex { q: -1, r: 0 }, // West
        Hex { q: -1, r: 1 }, // Southwest
        Hex { q: 0, r: 1 },  // Southeast
    ];

    #[inline]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    #[inline]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    #[inline]
    pub const fn offset(self, dq: i32, dr: i32) -> Hex {
        Hex {
            q: self.q + dq,
            r: self.r + dr,
        }
    }

    pub fn neighbors(self) -> impl Iterator<Item = Hex> {
        Self::DIRECTIONS
            .into_iter()
            .map(move |d| self.offset(d.q, d.r))
    }

    #[inline]
    pub fn distance(self, other: Hex) -> i32 {
        ((self.q - other.q).abs() + (self.r - other.r).abs() + (self.s() - other.s()).abs()) / 2
    }
}

/// The two hex corners a node is canonically named after: every other corner of a hex is the
/// north or south corner of a neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    North,
    South,
}

/// The three hex sides an edge is canonically named after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    NorthEast,
    East,
    SouthEast,
}

/// What a [`Coord`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Site {
    Hex(Hex),
    Node(Hex, Corner),
    Edge(Hex, Side),
}

/// Packed board coordinate of a hex, node or edge.
///
/// Layout: `q + 128` in bits 16..24, `r + 128` in bits 8..16, a site tag in bits 0..8
/// (0 hex, 1 north node, 2 south node, 3 north-east edge, 4 east edge, 5 south-east edge).
/// `Coord(0)` never names a site and is used on the wire for "no coordinate". Decoding rejects
/// any other value that is not in this layout, so one site has exactly one wire value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Coord(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("not a board coordinate: {0:#x}")]
pub struct InvalidCoord(pub u32);

impl TryFrom<u32> for Coord {
    type Error = InvalidCoord;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        let coord = Coord(value);
        if coord.is_canonical() {
            Ok(coord)
        } else {
            Err(InvalidCoord(value))
        }
    }
}

impl From<Coord> for u32 {
    fn from(coord: Coord) -> u32 {
        coord.0
    }
}

impl Coord {
    pub const NONE: Coord = Coord(0);

    const BIAS: i32 = 128;

    fn pack(hex: Hex, tag: u32) -> Coord {
        let q = (hex.q + Self::BIAS).clamp(0, 255) as u32;
        let r = (hex.r + Self::BIAS).clamp(0, 255) as u32;
        Coord((q << 16) | (r << 8) | tag)
    }

    pub fn hex(q: i32, r: i32) -> Coord {
        Self::pack(Hex::new(q, r), 0)
    }

    pub fn node(q: i32, r: i32, corner: Corner) -> Coord {
        let tag = match corner {
            Corner::North => 1,
            Corner::South => 2,
        };
        Self::pack(Hex::new(q, r), tag)
    }

    pub fn edge(q: i32, r: i32, side: Side) -> Coord {
        let tag = match side {
            Side::NorthEast => 3,
            Side::East => 4,
            Side::SouthEast => 5,
        };
        Self::pack(Hex::new(q, r), tag)
    }

    /// Decode the packed value; `None` for `Coord::NONE` and unknown tags.
    pub fn site(self) -> Option<Site> {
        if self == Self::NONE {
            return None;
        }
        let hex = Hex::new(
            ((self.0 >> 16) & 0xff) as i32 - Self::BIAS,
            ((self.0 >> 8) & 0xff) as i32 - Self::BIAS,
        );
        match self.0 & 0xff {
            0 => Some(Site::Hex(hex)),
            1 => Some(Site::Node(hex, Corner::North)),
            2 => Some(Site::Node(hex, Corner::South)),
            3 => Some(Site::Edge(hex, Side::NorthEast)),
            4 => Some(Site::Edge(hex, Side::East)),
            5 => Some(Site::Edge(hex, Side::SouthEast)),
            _ => None,
        }
    }

    /// `NONE`, or a value with nothing above bit 24 and a known site tag.
    pub fn is_canonical(self) -> bool {
        self == Self::NONE || (self.0 >> 24 == 0 && self.0 & 0xff <= 5)
    }

    pub fn is_node(self) -> bool {
        matches!(self.site(), Some(Site::Node(..)))
    }

    pub fn is_edge(self) -> bool {
        matches!(self.site(), Some(Site::Edge(..)))
    }

    pub fn is_hex(self) -> bool {
        matches!(self.site(), Some(Site::Hex(_)))
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.site() {
            Some(Site::Hex(h)) => write!(f, "hex({},{})", h.q, h.r),
            Some(Site::Node(h, c)) => write!(f, "node({},{},{:?})", h.q, h.r, c),
            Some(Site::Edge(h, s)) => write!(f, "edge({},{},{:?})", h.q, h.r, s),
            None => write!(f, "Coord({:#x})", self.0),
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_sites_decode_back() {
        let node = Coord::node(-2, 3, Corner::South);
        assert_eq!(node.site(), Some(Site::Node(Hex::new(-2, 3), Corner::South)));
        assert!(node.is_node());
        assert!(!node.is_edge());

        let edge = Coord::edge(0, -1, Side::SouthEast);
        assert_eq!(edge.site(), Some(Site::Edge(Hex::new(0, -1), Side::SouthEast)));

        assert_eq!(Coord::NONE.site(), None);
        assert_eq!(Coord(0x0000_ff).site(), None);
    }

    #[test]
    fn origin_hex_is_not_the_empty_coordinate() {
        assert_ne!(Coord::hex(0, 0), Coord::NONE);
        assert!(Coord::hex(0, 0).is_hex());
    }

    #[test]
    fn only_canonical_values_decode() {
        let edge = Coord::edge(0, 0, Side::NorthEast);
        let json = serde_json::to_string(&edge).unwrap();
        assert_eq!(json, edge.0.to_string());
        assert_eq!(serde_json::from_str::<Coord>(&json).unwrap(), edge);
        assert_eq!(serde_json::from_str::<Coord>("0").unwrap(), Coord::NONE);
        assert_eq!(Coord::default(), Coord::NONE);

        // same site as `edge` once the high byte is ignored
        let alias = (edge.0 | 0x0100_0000).to_string();
        assert!(serde_json::from_str::<Coord>(&alias).is_err());
        let bad_tag = (Coord::hex(1, 1).0 | 0x06).to_string();
        assert!(serde_json::from_str::<Coord>(&bad_tag).is_err());
        assert_eq!(
            Coord::try_from(edge.0 | 0x0100_0000),
            Err(InvalidCoord(edge.0 | 0x0100_0000))
        );
    }

    #[test]
    fn distance_counts_steps() {
        assert_eq!(Hex::new(0, 0).distance(Hex::new(3, -1)), 3);
        assert_eq!(Hex::new(1, 1).distance(Hex::new(1, 1)), 0);
        assert_eq!(Hex::new(0, 0).neighbors().count(), 6);
    }
}
