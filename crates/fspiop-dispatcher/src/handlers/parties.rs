//! party-info-requested / party-query-response callbacks.
//!
//! Both flows relay on behalf of the switch, so the outbound headers go
//! through switch-identity substitution when an inbound protocol state is
//! present. The two flows fail differently: info requests always try an
//! error callback to the requester, while the query-response flow only
//! delivers an error for the allow-list check and otherwise logs and stops.
//! That asymmetry is deliberate and pinned by tests.

use serde_json::json;

use fspiop_core::{
    apply_switch_identity, callback_path, callback_url, validate_headers, CallbackOutcome,
    CallbackResource, DomainEventEnvelope, EventName, EventPayload, FspiopError, FspiopHeaders,
    HttpMethod, OutboundRequest, PartyInfoPayload, PartyResultPayload, PARTY_ID_TYPES,
};

use crate::metrics::EVENTS_DROPPED;
use crate::state::DispatcherState;

use super::{
    deliver, drop_mismatched_payload, drop_unresolvable, error_body, error_information,
    resolve_endpoint,
};

pub(crate) async fn handle_info_requested(state: &DispatcherState, envelope: &DomainEventEnvelope) {
    let event = EventName::PartyInfoRequested;
    let EventPayload::PartyInfo(payload) = &envelope.payload else {
        return drop_mismatched_payload(event);
    };

    // Errors are reported to the requester, so its endpoint gates the flow.
    let requester_endpoint = match resolve_endpoint(state, &payload.requester_fsp).await {
        Ok(endpoint) => endpoint,
        Err(e) => return drop_unresolvable(event, &payload.requester_fsp, &e),
    };
    let headers = envelope.inbound_headers().cloned().unwrap_or_default();

    if let Err(error) = attempt_lookup(state, envelope, payload, &headers).await {
        let info = error_information(&error);
        let path = callback_path(
            CallbackResource::Parties,
            Some(&payload.party_id_type),
            &payload.party_id,
            payload.party_sub_id.as_deref(),
            CallbackOutcome::Error,
        );
        let request = OutboundRequest {
            url: callback_url(&requester_endpoint, &path),
            method: HttpMethod::Put,
            headers: headers.clone(),
            source: None,
            destination: headers
                .destination()
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            payload: Some(error_body(&info)),
        };
        if let Err(delivery_error) = deliver(state, event, request).await {
            tracing::error!(
                event = event.as_str(),
                error = %delivery_error,
                "error callback delivery failed"
            );
        }
    }
}

async fn attempt_lookup(
    state: &DispatcherState,
    envelope: &DomainEventEnvelope,
    payload: &PartyInfoPayload,
    headers: &FspiopHeaders,
) -> Result<(), FspiopError> {
    let event = EventName::PartyInfoRequested;
    envelope.validate_payload()?;
    validate_headers(
        CallbackResource::Parties,
        payload.party_sub_id.is_some(),
        headers,
    )?;

    let destination_fsp = payload
        .destination_fsp
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| FspiopError::validation("party lookup names no destination FSP"))?;
    let destination_endpoint = resolve_endpoint(state, destination_fsp).await?;

    let mut out_headers = headers.clone();
    if envelope.inbound_protocol_state.is_some() {
        apply_switch_identity(&mut out_headers, &state.switch_fsp_id);
    }

    let path = callback_path(
        CallbackResource::Parties,
        Some(&payload.party_id_type),
        &payload.party_id,
        payload.party_sub_id.as_deref(),
        CallbackOutcome::Success,
    );
    let request = OutboundRequest {
        url: callback_url(&destination_endpoint, &path),
        method: HttpMethod::Get,
        headers: out_headers,
        source: None,
        destination: None,
        payload: None,
    };
    deliver(state, event, request).await
}

pub(crate) async fn handle_query_response(state: &DispatcherState, envelope: &DomainEventEnvelope) {
    let event = EventName::PartyQueryResponse;
    let EventPayload::PartyResult(payload) = &envelope.payload else {
        return drop_mismatched_payload(event);
    };

    let source_endpoint = match resolve_endpoint(state, &payload.owner_fsp).await {
        Ok(endpoint) => endpoint,
        Err(e) => return drop_unresolvable(event, &payload.owner_fsp, &e),
    };
    let headers = envelope.inbound_headers().cloned().unwrap_or_default();

    // Allow-list gate: a type outside the list is reported back to the
    // source inline, never delivered as a success.
    if !PARTY_ID_TYPES.contains(&payload.party_id_type.as_str()) {
        let info = error_information(&FspiopError::validation(format!(
            "unsupported party id type: {}",
            payload.party_id_type
        )));
        let path = callback_path(
            CallbackResource::Parties,
            Some(&payload.party_id_type),
            &payload.party_id,
            payload.party_sub_id.as_deref(),
            CallbackOutcome::Error,
        );
        let request = OutboundRequest {
            url: callback_url(&source_endpoint, &path),
            method: HttpMethod::Put,
            headers: headers.clone(),
            source: None,
            destination: headers
                .destination()
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            payload: Some(error_body(&info)),
        };
        if let Err(delivery_error) = deliver(state, event, request).await {
            tracing::error!(
                event = event.as_str(),
                error = %delivery_error,
                "error callback delivery failed"
            );
        }
        return;
    }

    // Any other failure in this flow is logged with no outbound error
    // callback, unlike the three sibling handlers.
    if let Err(error) = attempt_result(state, envelope, payload, &source_endpoint, &headers).await {
        EVENTS_DROPPED
            .with_label_values(&[event.as_str(), "failed"])
            .inc();
        tracing::error!(
            event = event.as_str(),
            error = %error,
            "party result delivery failed, no error callback issued"
        );
    }
}

async fn attempt_result(
    state: &DispatcherState,
    envelope: &DomainEventEnvelope,
    payload: &PartyResultPayload,
    owner_endpoint: &str,
    headers: &FspiopHeaders,
) -> Result<(), FspiopError> {
    let event = EventName::PartyQueryResponse;
    envelope.validate_payload()?;
    validate_headers(
        CallbackResource::Parties,
        payload.party_sub_id.is_some(),
        headers,
    )?;

    let mut out_headers = headers.clone();
    if envelope.inbound_protocol_state.is_some() {
        apply_switch_identity(&mut out_headers, &state.switch_fsp_id);
    }

    let path = callback_path(
        CallbackResource::Parties,
        Some(&payload.party_id_type),
        &payload.party_id,
        payload.party_sub_id.as_deref(),
        CallbackOutcome::Success,
    );
    let request = OutboundRequest {
        url: callback_url(owner_endpoint, &path),
        method: HttpMethod::Put,
        headers: out_headers,
        source: None,
        destination: None,
        payload: Some(json!({ "party": payload.party })),
    };
    deliver(state, event, request).await
}
