//! Chat registration state machine
//!
//! Pure stage transitions plus a tracker that owns the per-chat stage map
//! and talks to the registrant store.

mod effect;
pub mod stage;
pub mod store;
mod tracker;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use effect::{Effect, Reply};
pub use stage::{Stage, StageKey};
pub use store::{RegistrantStore, WriteError};
pub use tracker::{Advance, IncomingMessage, RegistrationTracker};
pub use transition::{transition, EventContext, Input, Transition, WriteOutcome};

/// Literal that restarts the bot conversation in the chat client
pub const RESTART_COMMAND: &str = "/start";
