//! Board layouts: hex terrain, dice numbers, ports and the robber/pirate start.

pub mod geometry;
mod loader;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use settlers_protocol::{Coord, Hex, PieceKind, ResourceKind, Site};

pub use loader::{load_layout, LayoutError, LayoutSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Clay,
    Ore,
    Sheep,
    Wheat,
    Wood,
    Desert,
    Gold,
    Sea,
}

impl Terrain {
    pub const fn resource(self) -> Option<ResourceKind> {
        match self {
            Terrain::Clay => Some(ResourceKind::Clay),
            Terrain::Ore => Some(ResourceKind::Ore),
            Terrain::Sheep => Some(ResourceKind::Sheep),
            Terrain::Wheat => Some(ResourceKind::Wheat),
            Terrain::Wood => Some(ResourceKind::Wood),
            Terrain::Desert | Terrain::Gold | Terrain::Sea => None,
        }
    }

    pub const fn is_land(self) -> bool {
        !matches!(self, Terrain::Sea)
    }

    /// Terrain that needs a dice number.
    pub const fn produces(self) -> bool {
        matches!(
            self,
            Terrain::Clay
                | Terrain::Ore
                | Terrain::Sheep
                | Terrain::Wheat
                | Terrain::Wood
                | Terrain::Gold
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexTile {
    pub terrain: Terrain,
    pub number: Option<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// 3:1 for any resource.
    Generic,
    /// 2:1 for one resource.
    Clay,
    Ore,
    Sheep,
    Wheat,
    Wood,
}

impl PortKind {
    pub const fn resource(self) -> Option<ResourceKind> {
        match self {
            PortKind::Generic => None,
            PortKind::Clay => Some(ResourceKind::Clay),
            PortKind::Ore => Some(ResourceKind::Ore),
            PortKind::Sheep => Some(ResourceKind::Sheep),
            PortKind::Wheat => Some(ResourceKind::Wheat),
            PortKind::Wood => Some(ResourceKind::Wood),
        }
    }
}

/// A compiled board. Immutable for the life of a session.
#[derive(Clone, Debug)]
pub struct BoardLayout {
    name: String,
    hexes: BTreeMap<Hex, HexTile>,
    /// Port access by node.
    ports: BTreeMap<Coord, PortKind>,
    robber_start: Coord,
    pirate_start: Option<Coord>,
}

impl BoardLayout {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tile(&self, hex: Hex) -> Option<HexTile> {
        self.hexes.get(&hex).copied()
    }

    pub fn tiles(&self) -> impl Iterator<Item = (Hex, HexTile)> + '_ {
        self.hexes.iter().map(|(h, t)| (*h, *t))
    }

    pub fn robber_start(&self) -> Coord {
        self.robber_start
    }

    pub fn pirate_start(&self) -> Option<Coord> {
        self.pirate_start
    }

    pub fn has_pirate(&self) -> bool {
        self.pirate_start.is_some()
    }

    fn is_land(&self, hex: Hex) -> bool {
        self.tile(hex).is_some_and(|t| t.terrain.is_land())
    }

    fn is_sea(&self, hex: Hex) -> bool {
        self.tile(hex).is_some_and(|t| t.terrain == Terrain::Sea)
    }

    /// Land hex (robber target) at `at`.
    pub fn is_land_hex(&self, at: Coord) -> bool {
        matches!(at.site(), Some(Site::Hex(h)) if self.is_land(h))
    }

    /// Sea hex (pirate target) at `at`.
    pub fn is_sea_hex(&self, at: Coord) -> bool {
        matches!(at.site(), Some(Site::Hex(h)) if self.is_sea(h))
    }

    /// Settlements need a node touching at least one land hex.
    pub fn is_land_node(&self, at: Coord) -> bool {
        geometry::node_hexes(at).into_iter().any(|h| self.is_land(h))
    }

    /// Roads need a land hex on one side, ships a sea hex; coastal edges allow both.
    pub fn edge_allows(&self, piece: PieceKind, at: Coord) -> bool {
        let hexes = geometry::edge_hexes(at);
        match piece {
            PieceKind::Road => hexes.iter().any(|h| self.is_land(*h)),
            PieceKind::Ship => hexes.iter().any(|h| self.is_sea(*h)),
            PieceKind::Settlement | PieceKind::City => false,
        }
    }

    /// Producing hexes for a dice total, in coordinate order.
    pub fn hexes_rolling(&self, total: u8) -> impl Iterator<Item = (Hex, HexTile)> + '_ {
        self.hexes
            .iter()
            .filter(move |(_, t)| t.number == Some(total))
            .map(|(h, t)| (*h, *t))
    }

    pub fn port_at(&self, node: Coord) -> Option<PortKind> {
        self.ports.get(&node).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlers_protocol::{Corner, Side};

    fn harbor() -> BoardLayout {
        load_layout(LayoutSource::Embedded).expect("embedded layout")
    }

    #[test]
    fn coastal_edges_allow_roads_and_ships() {
        let layout = harbor();
        // ore (1,0) | sea (2,0)
        let coast = Coord::edge(1, 0, Side::East);
        assert!(layout.edge_allows(PieceKind::Road, coast));
        assert!(layout.edge_allows(PieceKind::Ship, coast));

        // wheat (0,0) | ore (1,0)
        let inland = Coord::edge(0, 0, Side::East);
        assert!(layout.edge_allows(PieceKind::Road, inland));
        assert!(!layout.edge_allows(PieceKind::Ship, inland));

        // sea (2,-1) | sea (2,0)
        let open_sea = Coord::edge(2, -1, Side::SouthEast);
        assert!(!layout.edge_allows(PieceKind::Road, open_sea));
        assert!(layout.edge_allows(PieceKind::Ship, open_sea));
    }

    #[test]
    fn ports_cover_both_ends_of_their_edge() {
        let layout = harbor();
        assert_eq!(
            layout.port_at(Coord::node(2, -1, Corner::South)),
            Some(PortKind::Sheep)
        );
        assert_eq!(
            layout.port_at(Coord::node(1, 1, Corner::North)),
            Some(PortKind::Sheep)
        );
        assert_eq!(
            layout.port_at(Coord::node(-1, -1, Corner::South)),
            Some(PortKind::Generic)
        );
        assert_eq!(layout.port_at(Coord::node(0, 0, Corner::North)), None);
    }

    #[test]
    fn robber_starts_on_the_desert() {
        let layout = harbor();
        assert_eq!(layout.robber_start(), Coord::hex(0, 1));
        assert_eq!(layout.pirate_start(), Some(Coord::hex(-2, 2)));
        assert!(layout.is_land_hex(Coord::hex(3, -1)));
        assert!(layout.is_sea_hex(Coord::hex(2, 0)));
        assert_eq!(layout.hexes_rolling(8).count(), 1);
    }
}
