//! FSPIOP protocol core for the interoperability gateway.
//!
//! Translates synchronous FSPIOP REST calls into asynchronous domain events
//! and back into outbound HTTP callbacks at the boundary of a settlement
//! switch.
//!
//! # Three-stage model
//!
//! - **Entry adapter** (the `fspiop-gateway` crate) — validates inbound REST
//!   requests and publishes a [`DomainEventEnvelope`] to the event bus
//! - **Event bus** — any [`EventProducer`]/[`EventConsumer`] pair; an
//!   in-memory implementation lives in [`bus`]
//! - **Dispatcher** (the `fspiop-dispatcher` crate) — consumes events,
//!   resolves the counterparty endpoint and issues the HTTP callback
//!
//! This crate holds everything both sides share: the condition/fulfilment
//! crypto, the FSPIOP header policy, the event envelope and callback
//! templates, and the collaborator traits.

pub mod bus;
pub mod collaborators;
pub mod constants;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod headers;
pub mod template;
pub mod validation;

// Re-exports
pub use constants::*;
pub use error::FspiopError;

pub use bus::{InMemoryBus, InMemoryConsumer, InMemoryProducer, DEFAULT_BUS_CAPACITY};
pub use collaborators::{
    CallbackSender, EndpointType, EventConsumer, EventProducer, HttpMethod, JwsVerifier,
    OutboundRequest, ParticipantDirectory, ParticipantEndpoint, ParticipantInfo, PayloadValidator,
    SignaturePresenceVerifier,
};
pub use crypto::{derive_condition, validate_fulfilment};
pub use envelope::{
    AssociationPayload, DomainEventEnvelope, ErrorInformation, EventName, EventPayload, Extension,
    ExtensionList, Money, PartyInfoPayload, PartyResultPayload, ProtocolState, TracingInfo,
    TransferErrorPayload, TransferPreparePayload, TransferResultPayload,
};
pub use headers::{apply_switch_identity, validate_headers, FspiopHeaders};
pub use template::{callback_path, callback_url, CallbackOutcome, CallbackResource};
pub use validation::StandardValidator;
