//! Event dispatcher for the FSPIOP gateway.
//!
//! Drains the event bus and turns each domain event into the outbound HTTP
//! callback the protocol requires: resolve the counterparty's endpoint via
//! the participant directory, build the callback from the resource's request
//! template, deliver it. Resolution failures are terminal (there is nowhere
//! to report them); most other failures produce an error-template callback.

pub mod bootstrap;
pub mod directory;
pub mod handlers;
pub mod metrics;
pub mod sender;
pub mod state;

pub use bootstrap::spawn;
pub use directory::{HttpParticipantDirectory, StaticParticipantDirectory};
pub use sender::HttpCallbackSender;
pub use state::DispatcherState;
