//! Shared types and collaborator contracts for the channel services engine.
//!
//! Everything the topic engine consumes from the rest of the services
//! process is expressed here as a trait, so the engine itself never
//! knows which transport, audit sink or clock it is talking to.

pub mod access;
pub mod actor;
pub mod clock;
pub mod error;
pub mod link;

pub use access::{AccessFlags, InvalidFlag};
pub use actor::{Actor, ParseActorError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Fault;
pub use link::{AuditLog, TopicChange, UpstreamLink};
