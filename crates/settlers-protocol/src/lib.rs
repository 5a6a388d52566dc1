//! Wire-level types shared by the settlers session engine and its server.

mod command;
mod coord;
mod event;
mod ids;
mod resource;
mod snapshot;
mod types;
pub mod wire;

pub use crate::command::*;
pub use crate::coord::*;
pub use crate::event::*;
pub use crate::ids::*;
pub use crate::resource::*;
pub use crate::snapshot::*;
pub use crate::types::*;
