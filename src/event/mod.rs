//! Event parsing, the name registry, and the dispatcher that applies a
//! channel's event stream to channel/master state and spawns voices (§4.6,
//! §4.7).

pub mod dispatcher;
pub mod registry;
pub mod types;

pub use types::{ArgShape, Event, EventArg};
