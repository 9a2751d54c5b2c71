//! Shared ingress steps used by every (resource, verb) handler.

use actix_web::{HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};

use fspiop_core::{
    DomainEventEnvelope, EventName, EventPayload, FspiopError, FspiopHeaders, ProtocolState,
};

use crate::error::GatewayError;
use crate::metrics::{INGRESS_ACCEPTED, INGRESS_REJECTED, PUBLISH_FAILURES};
use crate::state::AppState;

/// Headers the envelope carries through the pipeline.
const CARRIED_HEADERS: &[&str] = &["accept", "content-type", "date"];

/// Clone the FSPIOP-relevant inbound headers, preserving wire order.
pub fn extract_headers(req: &HttpRequest) -> FspiopHeaders {
    let mut headers = FspiopHeaders::new();
    for (name, value) in req.headers() {
        let name_lower = name.as_str().to_lowercase();
        if CARRIED_HEADERS.contains(&name_lower.as_str()) || name_lower.starts_with("fspiop-") {
            if let Ok(value_str) = value.to_str() {
                headers.set(&name_lower, value_str);
            }
        }
    }
    headers
}

/// Reject with the fixed malformed-syntax envelope, counting the rejection.
pub fn malformed(event: EventName) -> GatewayError {
    INGRESS_REJECTED
        .with_label_values(&[event.as_str(), "malformed"])
        .inc();
    GatewayError::MalformedSyntax
}

/// The requester identity must be present and non-empty on ingress.
pub fn require_source(headers: &FspiopHeaders, event: EventName) -> Result<String, GatewayError> {
    match headers.source() {
        Some(source) if !source.is_empty() => Ok(source.to_string()),
        _ => Err(malformed(event)),
    }
}

pub fn require_non_empty(value: &str, event: EventName) -> Result<(), GatewayError> {
    if value.is_empty() {
        Err(malformed(event))
    } else {
        Ok(())
    }
}

/// Presence check for a resource-mandatory body field.
pub fn require(field: Option<String>, event: EventName) -> Result<String, GatewayError> {
    match field {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(malformed(event)),
    }
}

/// JSON body that does not parse at all is malformed syntax, same as a
/// missing mandatory field.
pub fn json_config() -> actix_web::web::JsonConfig {
    actix_web::web::JsonConfig::default()
        .error_handler(|_err, _req| GatewayError::MalformedSyntax.into())
}

/// Prepare/creation requests only: the expiration must parse and lie in the
/// future at time of ingress. Never re-evaluated afterwards.
pub fn check_expiration(expiration: &str, event: EventName) -> Result<(), GatewayError> {
    let parsed = DateTime::parse_from_rfc3339(expiration).map_err(|_| malformed(event))?;
    if parsed.with_timezone(&Utc) <= Utc::now() {
        return Err(malformed(event));
    }
    Ok(())
}

/// JWS verification over headers and body, when enabled.
pub fn verify_jws(
    state: &AppState,
    headers: &FspiopHeaders,
    body: &serde_json::Value,
    event: EventName,
) -> Result<(), GatewayError> {
    if !state.jws.is_enabled() {
        return Ok(());
    }
    state.jws.validate(headers, body).map_err(|e| {
        INGRESS_REJECTED
            .with_label_values(&[event.as_str(), "jws"])
            .inc();
        GatewayError::from(e)
    })
}

/// Count a validator rejection before converting it to the HTTP envelope.
pub fn validation_failure(e: FspiopError, event: EventName) -> GatewayError {
    INGRESS_REJECTED
        .with_label_values(&[event.as_str(), "validation"])
        .inc();
    GatewayError::from(e)
}

/// Build the envelope, self-check it, publish it.
pub async fn publish(
    state: &AppState,
    event: EventName,
    payload: EventPayload,
    protocol_state: Option<ProtocolState>,
) -> Result<(), GatewayError> {
    let envelope = DomainEventEnvelope::new(event, payload, protocol_state);

    // Contract self-check: a failure here is a bug in the handler, not a
    // caller error, and surfaces as 500.
    envelope.validate_payload()?;

    let trace_id = envelope.tracing_info.trace_id.clone();
    match state.producer.send(envelope).await {
        Ok(()) => {
            INGRESS_ACCEPTED.with_label_values(&[event.as_str()]).inc();
            tracing::info!(event = event.as_str(), trace_id = %trace_id, "event published");
            Ok(())
        }
        Err(e) => {
            PUBLISH_FAILURES.with_label_values(&[event.as_str()]).inc();
            tracing::error!(event = event.as_str(), error = %e, "bus publish failed");
            Err(GatewayError::from(e))
        }
    }
}

/// 202: resource creation/ingestion accepted.
pub fn accepted() -> HttpResponse {
    HttpResponse::Accepted().finish()
}

/// 200: synchronous-style acknowledgment (fulfil/result puts).
pub fn acknowledged() -> HttpResponse {
    HttpResponse::Ok().finish()
}
