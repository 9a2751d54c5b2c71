//! Per-event callback handlers.
//!
//! Dispatch is total over the closed event-name set; an unrecognized wire
//! name is logged and skipped, never an error. Shared failure semantics:
//! endpoint resolution failures are terminal drops, delivery failures are
//! logged and never retried here.

mod associations;
mod parties;
mod transfers;

use fspiop_core::{
    DomainEventEnvelope, ErrorInformation, EventName, FspiopError, OutboundRequest,
    ERR_INTERNAL, ERR_MALFORMED_SYNTAX, ERR_MALFORMED_SYNTAX_MSG, ERR_MISSING_ELEMENT,
};

use crate::metrics::{CALLBACKS_FAILED, CALLBACKS_SENT, EVENTS_DROPPED};
use crate::state::DispatcherState;

/// Route one consumed envelope to its handler.
pub async fn dispatch(state: &DispatcherState, envelope: DomainEventEnvelope) {
    let Some(name) = EventName::from_name(&envelope.name) else {
        EVENTS_DROPPED
            .with_label_values(&[envelope.name.as_str(), "unknown-name"])
            .inc();
        tracing::warn!(event = %envelope.name, "unknown event name, skipping");
        return;
    };

    tracing::debug!(
        event = name.as_str(),
        trace_id = %envelope.tracing_info.trace_id,
        "dispatching event"
    );

    match name {
        EventName::AssociationCreated | EventName::AssociationRemoved => {
            associations::handle(state, name, &envelope).await
        }
        EventName::PartyInfoRequested => parties::handle_info_requested(state, &envelope).await,
        EventName::PartyQueryResponse => parties::handle_query_response(state, &envelope).await,
        EventName::TransferPrepared => transfers::handle_prepared(state, &envelope).await,
        EventName::TransferFulfilled => transfers::handle_fulfilled(state, &envelope).await,
        EventName::TransferErrored => transfers::handle_errored(state, &envelope).await,
    }
}

/// Resolve a participant's FSPIOP endpoint base URL.
pub(crate) async fn resolve_endpoint(
    state: &DispatcherState,
    fsp_id: &str,
) -> Result<String, FspiopError> {
    let info = state
        .directory
        .get_participant_info(fsp_id)
        .await?
        .ok_or_else(|| FspiopError::ParticipantNotFound(fsp_id.to_string()))?;
    info.fspiop_endpoint()
        .map(str::to_string)
        .ok_or_else(|| FspiopError::EndpointNotFound(fsp_id.to_string()))
}

/// Terminal drop: the callback addressee could not be resolved, so there is
/// no address to deliver even an error to.
pub(crate) fn drop_unresolvable(event: EventName, fsp_id: &str, error: &FspiopError) {
    EVENTS_DROPPED
        .with_label_values(&[event.as_str(), "resolution"])
        .inc();
    tracing::warn!(
        event = event.as_str(),
        fsp = fsp_id,
        error = %error,
        "endpoint resolution failed, dropping event"
    );
}

pub(crate) fn drop_mismatched_payload(event: EventName) {
    EVENTS_DROPPED
        .with_label_values(&[event.as_str(), "payload-mismatch"])
        .inc();
    tracing::warn!(
        event = event.as_str(),
        "payload variant does not match event name, skipping"
    );
}

/// Send one callback, counting the outcome per event.
pub(crate) async fn deliver(
    state: &DispatcherState,
    event: EventName,
    request: OutboundRequest,
) -> Result<(), FspiopError> {
    match state.sender.send_request(request).await {
        Ok(()) => {
            CALLBACKS_SENT.with_label_values(&[event.as_str()]).inc();
            Ok(())
        }
        Err(e) => {
            CALLBACKS_FAILED.with_label_values(&[event.as_str()]).inc();
            Err(e)
        }
    }
}

/// Error-template body for a handler failure.
pub(crate) fn error_information(error: &FspiopError) -> ErrorInformation {
    match error {
        FspiopError::Validation {
            code,
            description,
            extension_list,
        } => ErrorInformation {
            error_code: code.clone(),
            error_description: description.clone(),
            extension_list: extension_list.clone(),
        },
        FspiopError::HeaderValidation(msg) => ErrorInformation {
            error_code: ERR_MISSING_ELEMENT.to_string(),
            error_description: msg.clone(),
            extension_list: None,
        },
        FspiopError::MalformedSyntax => ErrorInformation {
            error_code: ERR_MALFORMED_SYNTAX.to_string(),
            error_description: ERR_MALFORMED_SYNTAX_MSG.to_string(),
            extension_list: None,
        },
        other => ErrorInformation {
            error_code: ERR_INTERNAL.to_string(),
            error_description: other.to_string(),
            extension_list: None,
        },
    }
}

pub(crate) fn error_body(info: &ErrorInformation) -> serde_json::Value {
    serde_json::json!({ "errorInformation": info })
}
