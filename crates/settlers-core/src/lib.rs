mod error;
pub mod event_log;
pub mod layout;
mod ledger;
mod phase;
pub mod placement;
mod player;
mod resources;
mod rng;
mod route_graph;
mod session;
pub mod visibility;

pub use crate::error::*;
pub use crate::event_log::{EventLog, EventLogError, LogEntry, LogTag};
pub use crate::layout::{load_layout, BoardLayout, LayoutError, LayoutSource};
pub use crate::ledger::*;
pub use crate::phase::*;
pub use crate::placement::{BoardView, Placement, StandardPlacement};
pub use crate::player::*;
pub use crate::resources::*;
pub use crate::rng::*;
pub use crate::route_graph::*;
pub use crate::session::*;
pub use crate::visibility::{
    redact, route, route_all, Audience, ObservabilityMode, Recipient, ScopedEvent, Secret,
};
