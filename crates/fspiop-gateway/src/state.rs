use std::sync::Arc;

use fspiop_core::{EventProducer, JwsVerifier, PayloadValidator, SignaturePresenceVerifier, StandardValidator};

use crate::config::GatewayConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub producer: Arc<dyn EventProducer>,
    pub validator: Arc<dyn PayloadValidator>,
    pub jws: Arc<dyn JwsVerifier>,
}

impl AppState {
    pub fn new(config: GatewayConfig, producer: Arc<dyn EventProducer>) -> Self {
        let validator = Arc::new(StandardValidator::new(config.currencies.clone()));
        let jws = Arc::new(SignaturePresenceVerifier::new(config.jws_enabled));
        Self {
            config: Arc::new(config),
            producer,
            validator,
            jws,
        }
    }
}
