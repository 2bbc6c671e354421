//! Channel topic mutation engine.
//!
//! A topic request flows through five stages, each in its own module:
//! [`gate`] → [`compose`] → [`validate`] → [`commit`] → [`sync`].
//! [`service::TopicService`] strings them together; [`engine::Engine`]
//! builds the service from configuration and handles reloads.

pub mod audit;
pub mod channel;
pub mod command;
pub mod commit;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod registration;
pub mod service;
pub mod sync;
pub mod validate;

pub use channel::{ChannelRecord, ChannelRegistry};
pub use command::{TopicRequest, TopicVerb};
pub use compose::TopicKind;
pub use engine::Engine;
pub use error::{EngineError, Forbidden, TopicError};
pub use registration::{RegistrationRecord, RegistrationStore};
pub use service::{Reply, TopicOutcome, TopicService};
