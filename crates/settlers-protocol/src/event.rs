use serde::{Deserialize, Serialize};

use crate::{Coord, DevCardKind, Phase, PickReason, PieceKind, PlayerId, ResourceKind, ResourceSet};

/// Direction of a player element change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementAction {
    Gain,
    Lose,
    Set,
}

/// Single numeric per-player fields that are announced one at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerElementKind {
    Resource(ResourceKind),
    Knights,
    PlayedDevCardFlag,
    AskedSpecialBuild,
    GoldPicks,
}

impl PlayerElementKind {
    pub fn code(self) -> u16 {
        match self {
            PlayerElementKind::Resource(kind) => u16::from(kind.code()),
            PlayerElementKind::Knights => 15,
            PlayerElementKind::AskedSpecialBuild => 16,
            PlayerElementKind::PlayedDevCardFlag => 19,
            PlayerElementKind::GoldPicks => 101,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevCardAction {
    Draw,
    Play,
    Reveal,
}

/// One player's share of a dice roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceGain {
    pub player: PlayerId,
    pub resources: ResourceSet,
    /// Hand size after the gain.
    pub total: u32,
}

/// All possible session→observer events. Fully serializable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // Game flow
    GameState {
        phase: Phase,
    },
    Turn {
        player: PlayerId,
        phase: Phase,
    },
    RollDicePrompt {
        player: PlayerId,
    },
    Text {
        text: String,
    },
    GameOver {
        winner: PlayerId,
        points: u32,
    },

    // Resources
    PlayerElements {
        player: PlayerId,
        action: ElementAction,
        resources: ResourceSet,
    },
    PlayerElement {
        player: PlayerId,
        action: ElementAction,
        element: PlayerElementKind,
        amount: u32,
        /// Whether clients should highlight the change to the affected player.
        #[serde(default)]
        news: bool,
    },
    ResourceCount {
        player: PlayerId,
        total: u32,
    },

    // Pieces and routes
    PutPiece {
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
    },
    MovePiece {
        player: PlayerId,
        piece: PieceKind,
        from: Coord,
        to: Coord,
    },
    UndoPutPiece {
        player: PlayerId,
        piece: PieceKind,
        at: Coord,
        /// `Coord::NONE` unless the undone action was a move.
        moved_from: Coord,
    },
    LongestRoute {
        holder: Option<PlayerId>,
    },
    LargestArmy {
        holder: Option<PlayerId>,
    },

    // Development cards
    DevCardAction {
        player: PlayerId,
        action: DevCardAction,
        card: DevCardKind,
    },
    DevCardBought {
        player: PlayerId,
        remaining: u32,
    },
    Monopolized {
        player: PlayerId,
        resource: ResourceKind,
        amount: u32,
    },
    PickedResources {
        player: PlayerId,
        resources: ResourceSet,
        reason: PickReason,
    },
    GoldPickRequest {
        player: PlayerId,
        count: u32,
    },

    // Dice and robber
    DiceRolled {
        player: PlayerId,
        dice: [u8; 2],
        total: u8,
    },
    DiceResources {
        gains: Vec<DiceGain>,
    },
    DiscardRequest {
        player: PlayerId,
        count: u32,
    },
    Discarded {
        player: PlayerId,
        resources: ResourceSet,
    },
    RobberMoved {
        player: PlayerId,
        hex: Coord,
        pirate: bool,
    },
    RobberyResult {
        perpetrator: PlayerId,
        victim: PlayerId,
        resources: ResourceSet,
    },

    // Trade
    BankTraded {
        player: PlayerId,
        give: ResourceSet,
        get: ResourceSet,
    },
    OfferMade {
        from: PlayerId,
        to: Vec<PlayerId>,
        give: ResourceSet,
        get: ResourceSet,
    },
    /// `None` clears every open offer.
    OfferCleared {
        player: Option<PlayerId>,
    },
    OfferAccepted {
        accepting: PlayerId,
        offering: PlayerId,
    },
}

impl Event {
    /// Stable kind identifier (matches the serde `type` tag).
    pub fn kind(&self) -> &'static str {
        match self {
            Event::GameState { .. } => "GameState",
            Event::Turn { .. } => "Turn",
            Event::RollDicePrompt { .. } => "RollDicePrompt",
            Event::Text { .. } => "Text",
            Event::GameOver { .. } => "GameOver",
            Event::PlayerElements { .. } => "PlayerElements",
            Event::PlayerElement { .. } => "PlayerElement",
            Event::ResourceCount { .. } => "ResourceCount",
            Event::PutPiece { .. } => "PutPiece",
            Event::MovePiece { .. } => "MovePiece",
            Event::UndoPutPiece { .. } => "UndoPutPiece",
            Event::LongestRoute { .. } => "LongestRoute",
            Event::LargestArmy { .. } => "LargestArmy",
            Event::DevCardAction { .. } => "DevCardAction",
            Event::DevCardBought { .. } => "DevCardBought",
            Event::Monopolized { .. } => "Monopolized",
            Event::PickedResources { .. } => "PickedResources",
            Event::GoldPickRequest { .. } => "GoldPickRequest",
            Event::DiceRolled { .. } => "DiceRolled",
            Event::DiceResources { .. } => "DiceResources",
            Event::DiscardRequest { .. } => "DiscardRequest",
            Event::Discarded { .. } => "Discarded",
            Event::RobberMoved { .. } => "RobberMoved",
            Event::RobberyResult { .. } => "RobberyResult",
            Event::BankTraded { .. } => "BankTraded",
            Event::OfferMade { .. } => "OfferMade",
            Event::OfferCleared { .. } => "OfferCleared",
            Event::OfferAccepted { .. } => "OfferAccepted",
        }
    }

    /// The player whose action the event describes, if any.
    pub fn actor(&self) -> Option<PlayerId> {
        match self {
            Event::GameState { .. }
            | Event::Text { .. }
            | Event::LongestRoute { .. }
            | Event::LargestArmy { .. }
            | Event::DiceResources { .. } => None,
            Event::Turn { player, .. }
            | Event::RollDicePrompt { player }
            | Event::PlayerElements { player, .. }
            | Event::PlayerElement { player, .. }
            | Event::ResourceCount { player, .. }
            | Event::PutPiece { player, .. }
            | Event::MovePiece { player, .. }
            | Event::UndoPutPiece { player, .. }
            | Event::DevCardAction { player, .. }
            | Event::DevCardBought { player, .. }
            | Event::Monopolized { player, .. }
            | Event::PickedResources { player, .. }
            | Event::GoldPickRequest { player, .. }
            | Event::DiceRolled { player, .. }
            | Event::DiscardRequest { player, .. }
            | Event::Discarded { player, .. }
            | Event::RobberMoved { player, .. }
            | Event::BankTraded { player, .. } => Some(*player),
            Event::GameOver { winner, .. } => Some(*winner),
            Event::RobberyResult { perpetrator, .. } => Some(*perpetrator),
            Event::OfferMade { from, .. } => Some(*from),
            Event::OfferCleared { player } => *player,
            Event::OfferAccepted { accepting, .. } => Some(*accepting),
        }
    }
}
