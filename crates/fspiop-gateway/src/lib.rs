//! FSPIOP HTTP entry adapter.
//!
//! One handler per (resource, HTTP verb). Each handler validates the inbound
//! request, builds a domain event envelope and publishes it to the event
//! bus, then replies immediately with an empty acceptance body — the
//! business result arrives later as a callback issued by the dispatcher.

pub mod config;
pub mod error;
pub mod ingress;
pub mod metrics;
pub mod routes;
pub mod state;
