//! Settlers table server
//!
//! Authoritative server: one queue worker per table applies commands in order and delivers
//! per-connection filtered events.

pub mod config;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod transport;

pub use config::{ConfigError, ServerConfig, TableConfig};
pub use protocol::*;
pub use queue::{Job, QueueError, TableQueue};
pub use registry::{RegistryError, SessionRegistry};
pub use transport::{ChannelTransport, ConnectionId, Transport, TransportError};
