//! Network protocol messages for table connections.
//!
//! Wraps settlers-protocol commands and events with the join/state handshake.

use serde::{Deserialize, Serialize};

use settlers_core::Rejection;
use settlers_protocol::{Command, Coord, Event, PieceKind, PlayerId, SessionId, SessionSnapshot};

/// Client-to-server messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Take a seat at a table, or watch it when `seat` is empty
    Join {
        session: SessionId,
        #[serde(default)]
        seat: Option<PlayerId>,
    },
    /// Apply one game command as the joined seat
    Command { command: Command },
    /// Undo the last build (`moved_from` empty) or ship move
    Undo {
        piece: PieceKind,
        at: Coord,
        #[serde(default)]
        moved_from: Coord,
    },
    /// Request the current table state as this connection may see it
    RequestState,
}

/// Server-to-client messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Join accepted; `seat` is empty for observers
    Joined {
        session: SessionId,
        seat: Option<PlayerId>,
        snapshot: SessionSnapshot,
    },
    /// Join refused
    JoinRejected { reason: JoinRejectReason },
    /// One game event, already filtered for the receiver
    Event { event: Event },
    /// The submitted command was refused; nothing changed
    Rejected { reason: Rejection },
    /// Table state (answer to `RequestState`)
    State { snapshot: SessionSnapshot },
}

/// Reasons for rejecting a join request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinRejectReason {
    UnknownSession,
    NoSuchSeat,
    SeatTaken,
    AlreadyJoined,
}

/// Serialize a client message for network transmission
pub fn serialize_client_message(msg: &ClientMessage) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::encode::to_vec_named(msg)
}

/// Deserialize a client message from network data
pub fn deserialize_client_message(data: &[u8]) -> Result<ClientMessage, rmp_serde::decode::Error> {
    rmp_serde::decode::from_slice(data)
}

/// Serialize a server message for network transmission
pub fn serialize_server_message(msg: &ServerMessage) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::encode::to_vec_named(msg)
}

/// Deserialize a server message from network data
pub fn deserialize_server_message(data: &[u8]) -> Result<ServerMessage, rmp_serde::decode::Error> {
    rmp_serde::decode::from_slice(data)
}
