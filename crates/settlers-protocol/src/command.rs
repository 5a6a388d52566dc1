use serde::{Deserialize, Serialize};

use crate::{Coord, DevCardKind, PieceKind, PlayerId, ResourceKind, ResourceSet};

/// All possible client→session commands. Fully serializable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    // Turn flow
    RollDice,
    EndTurn,

    // Building
    /// Ask to place a paid piece; enters the matching placing phase.
    RequestBuild { piece: PieceKind },
    CancelBuild,
    Build { piece: PieceKind, at: Coord },
    /// Outside one's own turn: build between this turn and the next.
    AskSpecialBuild,
    MovePiece { piece: PieceKind, from: Coord, to: Coord },
    /// Undo the last build or move. `moved_from` is `Coord::NONE` when undoing a build.
    Undo {
        piece: PieceKind,
        at: Coord,
        #[serde(default)]
        moved_from: Coord,
    },

    // Development cards
    BuyDevCard,
    PlayDevCard { card: DevCardKind },
    PickMonopoly { resource: ResourceKind },
    /// Free resources from a year of plenty card or a gold hex.
    PickResources { resources: ResourceSet },

    // Robber
    Discard { resources: ResourceSet },
    ChooseRobberOrPirate { pirate: bool },
    MoveRobber {
        hex: Coord,
        #[serde(default)]
        victim: Option<PlayerId>,
    },

    // Trade
    BankTrade { give: ResourceSet, get: ResourceSet },
    MakeOffer {
        to: Vec<PlayerId>,
        give: ResourceSet,
        get: ResourceSet,
    },
    ClearOffer,
    AcceptOffer { from: PlayerId },

    /// Any command kind this build does not know about.
    #[serde(other)]
    Unsupported,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RollDice => "RollDice",
            Command::EndTurn => "EndTurn",
            Command::RequestBuild { .. } => "RequestBuild",
            Command::CancelBuild => "CancelBuild",
            Command::Build { .. } => "Build",
            Command::AskSpecialBuild => "AskSpecialBuild",
            Command::MovePiece { .. } => "MovePiece",
            Command::Undo { .. } => "Undo",
            Command::BuyDevCard => "BuyDevCard",
            Command::PlayDevCard { .. } => "PlayDevCard",
            Command::PickMonopoly { .. } => "PickMonopoly",
            Command::PickResources { .. } => "PickResources",
            Command::Discard { .. } => "Discard",
            Command::ChooseRobberOrPirate { .. } => "ChooseRobberOrPirate",
            Command::MoveRobber { .. } => "MoveRobber",
            Command::BankTrade { .. } => "BankTrade",
            Command::MakeOffer { .. } => "MakeOffer",
            Command::ClearOffer => "ClearOffer",
            Command::AcceptOffer { .. } => "AcceptOffer",
            Command::Unsupported => "Unsupported",
        }
    }

    /// Every board coordinate the command carries.
    pub fn coords(&self) -> Vec<Coord> {
        match self {
            Command::Build { at, .. } => vec![*at],
            Command::MovePiece { from, to, .. } => vec![*from, *to],
            Command::Undo { at, moved_from, .. } => vec![*at, *moved_from],
            Command::MoveRobber { hex, .. } => vec![*hex],
            _ => Vec::new(),
        }
    }
}
