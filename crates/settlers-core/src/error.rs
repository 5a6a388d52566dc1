use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a command was refused. A rejected command changes nothing and emits nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("not allowed in the current game state")]
    WrongPhase,
    #[error("not this player's turn")]
    NotCurrentPlayer,
    #[error("not enough resources")]
    InsufficientResources,
    #[error("illegal placement")]
    IllegalPlacement,
    #[error("last action cannot be undone")]
    NotUndoable,
    #[error("unknown action kind")]
    UnknownActionKind,
    #[error("development card not available")]
    CardUnavailable,
    #[error("invalid choice")]
    InvalidChoice,
}
