use std::fmt;

use serde::{Deserialize, Serialize};

/// Board piece kinds. Roads and ships sit on edges, settlements and cities on nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    Road,
    Settlement,
    City,
    Ship,
}

impl PieceKind {
    pub const ALL: [PieceKind; 4] = [
        PieceKind::Road,
        PieceKind::Settlement,
        PieceKind::City,
        PieceKind::Ship,
    ];

    pub const fn code(self) -> u8 {
        match self {
            PieceKind::Road => 0,
            PieceKind::Settlement => 1,
            PieceKind::City => 2,
            PieceKind::Ship => 3,
        }
    }

    /// Roads and ships: pieces that form routes.
    pub const fn is_linear(self) -> bool {
        matches!(self, PieceKind::Road | PieceKind::Ship)
    }

    /// How many of this piece one player owns in total.
    pub const fn stock(self) -> u32 {
        match self {
            PieceKind::Road => 15,
            PieceKind::Settlement => 5,
            PieceKind::City => 4,
            PieceKind::Ship => 15,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PieceKind::Road => "road",
            PieceKind::Settlement => "settlement",
            PieceKind::City => "city",
            PieceKind::Ship => "ship",
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Development card kinds. `Unknown` is what observers see in place of a hidden card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevCardKind {
    Unknown,
    RoadBuilding,
    YearOfPlenty,
    Monopoly,
    VictoryPoint,
    Knight,
}

impl DevCardKind {
    pub const fn code(self) -> u8 {
        match self {
            DevCardKind::Unknown => 0,
            DevCardKind::RoadBuilding => 1,
            DevCardKind::YearOfPlenty => 2,
            DevCardKind::Monopoly => 3,
            DevCardKind::VictoryPoint => 4,
            DevCardKind::Knight => 9,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DevCardKind::Unknown => "unknown",
            DevCardKind::RoadBuilding => "Road Building",
            DevCardKind::YearOfPlenty => "Year of Plenty",
            DevCardKind::Monopoly => "Monopoly",
            DevCardKind::VictoryPoint => "Victory Point",
            DevCardKind::Knight => "Soldier",
        }
    }

    /// Victory point cards are never played; they only count toward the score.
    pub const fn is_playable(self) -> bool {
        matches!(
            self,
            DevCardKind::RoadBuilding
                | DevCardKind::YearOfPlenty
                | DevCardKind::Monopoly
                | DevCardKind::Knight
        )
    }
}

/// Session phase. Numeric codes are stable and used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingRoll,
    Play,
    PlacingRoad,
    PlacingSettlement,
    PlacingCity,
    PlacingRobber,
    PlacingPirate,
    PlacingShip,
    PlacingFreeRoad1,
    PlacingFreeRoad2,
    WaitingForDiscards,
    WaitingForDiscovery,
    WaitingForMonopoly,
    WaitingForRobberOrPirate,
    WaitingForGoldPick,
    /// Players who asked to build between turns do so, one at a time.
    SpecialBuilding,
    GameOver,
}

impl Phase {
    pub const fn code(self) -> u16 {
        match self {
            Phase::AwaitingRoll => 15,
            Phase::Play => 20,
            Phase::PlacingRoad => 30,
            Phase::PlacingSettlement => 31,
            Phase::PlacingCity => 32,
            Phase::PlacingRobber => 33,
            Phase::PlacingPirate => 34,
            Phase::PlacingShip => 35,
            Phase::PlacingFreeRoad1 => 40,
            Phase::PlacingFreeRoad2 => 41,
            Phase::WaitingForDiscards => 50,
            Phase::WaitingForDiscovery => 52,
            Phase::WaitingForMonopoly => 53,
            Phase::WaitingForRobberOrPirate => 54,
            Phase::WaitingForGoldPick => 56,
            Phase::SpecialBuilding => 100,
            Phase::GameOver => 1000,
        }
    }

    /// Phase that waits for a paid placement of the given piece.
    pub const fn placing(piece: PieceKind) -> Phase {
        match piece {
            PieceKind::Road => Phase::PlacingRoad,
            PieceKind::Settlement => Phase::PlacingSettlement,
            PieceKind::City => Phase::PlacingCity,
            PieceKind::Ship => Phase::PlacingShip,
        }
    }

    pub const fn placing_piece(self) -> Option<PieceKind> {
        match self {
            Phase::PlacingRoad => Some(PieceKind::Road),
            Phase::PlacingSettlement => Some(PieceKind::Settlement),
            Phase::PlacingCity => Some(PieceKind::City),
            Phase::PlacingShip => Some(PieceKind::Ship),
            _ => None,
        }
    }

    pub const fn is_free_placement(self) -> bool {
        matches!(self, Phase::PlacingFreeRoad1 | Phase::PlacingFreeRoad2)
    }
}

/// Why a player picks resources without paying for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickReason {
    Discovery,
    GoldHex,
}

impl PickReason {
    pub const fn code(self) -> u8 {
        match self {
            PickReason::Discovery => 2,
            PickReason::GoldHex => 3,
        }
    }
}
