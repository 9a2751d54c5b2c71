//! Interfaces to the gateway's external collaborators.
//!
//! The bus clients, participant directory, outbound sender, JWS verifier and
//! business validator are all injected as trait objects with explicit
//! lifecycles; nothing here is an ambient global.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::envelope::{DomainEventEnvelope, TransferPreparePayload, TransferResultPayload};
use crate::error::FspiopError;
use crate::headers::FspiopHeaders;

/// Endpoint types a participant may register. Only FSPIOP is actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointType {
    #[serde(rename = "FSPIOP")]
    Fspiop,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEndpoint {
    #[serde(rename = "type")]
    pub endpoint_type: EndpointType,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub endpoints: Vec<ParticipantEndpoint>,
}

impl ParticipantInfo {
    /// Base URL of the participant's FSPIOP endpoint, if registered.
    pub fn fspiop_endpoint(&self) -> Option<&str> {
        self.endpoints
            .iter()
            .find(|e| e.endpoint_type == EndpointType::Fspiop)
            .map(|e| e.value.as_str())
    }
}

/// Participant/endpoint directory lookup capability.
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// `Ok(None)` means the participant does not exist.
    async fn get_participant_info(
        &self,
        fsp_id: &str,
    ) -> Result<Option<ParticipantInfo>, FspiopError>;
}

/// Event bus producer handle. Must be safe for concurrent use by many
/// in-flight handlers; publish is a single atomic call.
#[async_trait]
pub trait EventProducer: Send + Sync {
    async fn send(&self, envelope: DomainEventEnvelope) -> Result<(), FspiopError>;
}

/// Event bus consumer handle, drained by the dispatcher loop.
#[async_trait]
pub trait EventConsumer: Send {
    /// `None` once the bus connection is closed.
    async fn next(&mut self) -> Option<DomainEventEnvelope>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

/// Fully-resolved outbound callback request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: FspiopHeaders,
    /// Overrides `fspiop-source` on the wire when set.
    pub source: Option<String>,
    /// Overrides `fspiop-destination` on the wire when set.
    pub destination: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Outbound HTTP callback capability. Retry, if any, belongs to the
/// implementation, never to the dispatcher.
#[async_trait]
pub trait CallbackSender: Send + Sync {
    async fn send_request(&self, request: OutboundRequest) -> Result<(), FspiopError>;
}

/// JSON-Web-Signature verification, consumed as a pass/fail capability.
pub trait JwsVerifier: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn validate(
        &self,
        headers: &FspiopHeaders,
        body: &serde_json::Value,
    ) -> Result<(), FspiopError>;
}

/// JWS verification by signature-header presence; disabled by default.
#[derive(Debug, Default)]
pub struct SignaturePresenceVerifier {
    enabled: bool,
}

impl SignaturePresenceVerifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl JwsVerifier for SignaturePresenceVerifier {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn validate(
        &self,
        headers: &FspiopHeaders,
        _body: &serde_json::Value,
    ) -> Result<(), FspiopError> {
        match headers.get(crate::constants::HDR_SIGNATURE) {
            Some(sig) if !sig.is_empty() => Ok(()),
            _ => Err(FspiopError::validation("missing fspiop-signature header")),
        }
    }
}

/// Resource-specific business validation checks.
pub trait PayloadValidator: Send + Sync {
    fn validate_transfer_prepare(
        &self,
        payload: &TransferPreparePayload,
    ) -> Result<(), FspiopError>;

    fn validate_transfer_result(&self, payload: &TransferResultPayload)
        -> Result<(), FspiopError>;

    fn validate_party_id_type(&self, party_id_type: &str) -> Result<(), FspiopError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fspiop_endpoint_selection() {
        let info = ParticipantInfo {
            endpoints: vec![
                ParticipantEndpoint {
                    endpoint_type: EndpointType::Unsupported,
                    value: "ws://dfsp1.example".into(),
                },
                ParticipantEndpoint {
                    endpoint_type: EndpointType::Fspiop,
                    value: "http://dfsp1.example".into(),
                },
            ],
        };
        assert_eq!(info.fspiop_endpoint(), Some("http://dfsp1.example"));
    }

    #[test]
    fn test_unknown_endpoint_type_deserializes_as_unsupported() {
        let json = r#"{"type":"ISO20022","value":"http://x"}"#;
        let endpoint: ParticipantEndpoint = serde_json::from_str(json).unwrap();
        assert_eq!(endpoint.endpoint_type, EndpointType::Unsupported);
        let info = ParticipantInfo {
            endpoints: vec![endpoint],
        };
        assert_eq!(info.fspiop_endpoint(), None);
    }

    #[test]
    fn test_signature_presence_verifier() {
        let verifier = SignaturePresenceVerifier::new(true);
        assert!(verifier.is_enabled());

        let mut headers = FspiopHeaders::new();
        let body = serde_json::json!({});
        assert!(verifier.validate(&headers, &body).is_err());

        headers.set("fspiop-signature", "eyJhbGciOiJSUzI1NiJ9..sig");
        assert!(verifier.validate(&headers, &body).is_ok());
    }
}
