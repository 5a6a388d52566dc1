use serde::{Deserialize, Serialize};

use crate::{Coord, DevCardKind, Phase, PieceKind, PlayerId, ResourceSet};

/// Full session state for save/resume and for (redacted) sync to clients.
///
/// The action history is not part of a snapshot: a resumed session starts with an empty ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub turn: u32,
    pub current_player: PlayerId,
    pub phase: Phase,
    /// Phase to return to once the robber has been placed.
    pub robber_return: Phase,
    pub players: Vec<PlayerSnapshot>,
    pub pieces: Vec<PieceSnapshot>,
    #[serde(default)]
    pub closed_routes: Vec<Coord>,
    pub longest_route_holder: Option<PlayerId>,
    pub largest_army_holder: Option<PlayerId>,
    pub robber: Coord,
    #[serde(default)]
    pub pirate: Option<Coord>,
    pub deck: Vec<DevCardKind>,
    #[serde(default)]
    pub pending_discards: Vec<PendingPick>,
    #[serde(default)]
    pub pending_gold_picks: Vec<PendingPick>,
    #[serde(default)]
    pub offers: Vec<OfferSnapshot>,
    #[serde(default)]
    pub last_bank_trade: Option<BankTradeSnapshot>,
    /// Ships the current player built this turn; they cannot move until the next one.
    #[serde(default)]
    pub ships_placed_this_turn: Vec<Coord>,
    #[serde(default)]
    pub moved_ship_this_turn: bool,
    /// During special building: the seat whose regular turn it follows.
    #[serde(default)]
    pub special_build_after: Option<PlayerId>,
    pub rng_state: [u8; 32],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub resources: ResourceSet,
    /// Cards playable this turn (and victory point cards).
    pub dev_cards: Vec<DevCardKind>,
    /// Cards bought this turn.
    #[serde(default)]
    pub new_dev_cards: Vec<DevCardKind>,
    pub knights: u32,
    #[serde(default)]
    pub played_dev_card: bool,
    #[serde(default)]
    pub asked_special_build: bool,
    /// Score visible to everyone (excludes victory point cards).
    pub public_score: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSnapshot {
    pub owner: PlayerId,
    pub piece: PieceKind,
    pub at: Coord,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPick {
    pub player: PlayerId,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSnapshot {
    pub from: PlayerId,
    pub to: Vec<PlayerId>,
    pub give: ResourceSet,
    pub get: ResourceSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTradeSnapshot {
    pub player: PlayerId,
    pub give: ResourceSet,
    pub get: ResourceSet,
}
