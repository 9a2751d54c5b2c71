//! transfer-prepared / transfer-fulfilled / transfer-errored callbacks.
//!
//! Prepares go to the payee; results and error notices go back to the
//! payer. The fulfilment/condition equality check happens here, when the
//! result payload carries the prepare-leg condition.

use serde_json::json;

use fspiop_core::{
    callback_path, callback_url, validate_fulfilment, validate_headers, CallbackOutcome,
    CallbackResource, DomainEventEnvelope, EventName, EventPayload, FspiopError, FspiopHeaders,
    HttpMethod, OutboundRequest, ProtocolState, TransferPreparePayload, TransferResultPayload,
};

use crate::state::DispatcherState;

use super::{
    deliver, drop_mismatched_payload, drop_unresolvable, error_body, error_information,
    resolve_endpoint,
};

pub(crate) async fn handle_prepared(state: &DispatcherState, envelope: &DomainEventEnvelope) {
    let event = EventName::TransferPrepared;
    let EventPayload::TransferPrepare(payload) = &envelope.payload else {
        return drop_mismatched_payload(event);
    };

    let payee_endpoint = match resolve_endpoint(state, &payload.payee_fsp).await {
        Ok(endpoint) => endpoint,
        Err(e) => return drop_unresolvable(event, &payload.payee_fsp, &e),
    };
    let headers = envelope.inbound_headers().cloned().unwrap_or_default();

    if let Err(error) = attempt_prepare(state, envelope, payload, &payee_endpoint, &headers).await {
        send_error_to_payer(
            state,
            event,
            &payload.payer_fsp,
            &payload.transfer_id,
            &headers,
            &error,
        )
        .await;
    }
}

async fn attempt_prepare(
    state: &DispatcherState,
    envelope: &DomainEventEnvelope,
    payload: &TransferPreparePayload,
    payee_endpoint: &str,
    headers: &FspiopHeaders,
) -> Result<(), FspiopError> {
    let event = EventName::TransferPrepared;
    envelope.validate_payload()?;
    validate_headers(CallbackResource::Transfers, false, headers)?;

    let body = serde_json::to_value(payload)
        .map_err(|e| FspiopError::Internal(format!("transfer prepare body: {e}")))?;
    let request = OutboundRequest {
        url: callback_url(payee_endpoint, "/transfers"),
        method: HttpMethod::Post,
        headers: headers.clone(),
        source: None,
        destination: Some(payload.payee_fsp.clone()),
        payload: Some(body),
    };
    deliver(state, event, request).await
}

pub(crate) async fn handle_fulfilled(state: &DispatcherState, envelope: &DomainEventEnvelope) {
    let event = EventName::TransferFulfilled;
    let EventPayload::TransferResult(payload) = &envelope.payload else {
        return drop_mismatched_payload(event);
    };

    let payer_endpoint = match resolve_endpoint(state, &payload.payer_fsp).await {
        Ok(endpoint) => endpoint,
        Err(e) => return drop_unresolvable(event, &payload.payer_fsp, &e),
    };
    let headers = envelope.inbound_headers().cloned().unwrap_or_default();

    if let Err(error) =
        attempt_fulfil(state, envelope, payload, &payer_endpoint, &headers).await
    {
        let info = error_information(&error);
        let path = callback_path(
            CallbackResource::Transfers,
            None,
            &payload.transfer_id,
            None,
            CallbackOutcome::Error,
        );
        let request = OutboundRequest {
            url: callback_url(&payer_endpoint, &path),
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

async fn attempt_fulfil(
    state: &DispatcherState,
    envelope: &DomainEventEnvelope,
    payload: &TransferResultPayload,
    payer_endpoint: &str,
    headers: &FspiopHeaders,
) -> Result<(), FspiopError> {
    let event = EventName::TransferFulfilled;
    envelope.validate_payload()?;
    validate_headers(CallbackResource::Transfers, false, headers)?;

    // Equality check only when the prepare-leg condition travelled with the
    // result; the format was already checked at ingress.
    if let Some(condition) = &payload.condition {
        let transfer_state = ProtocolState::fspiop(FspiopHeaders::new())
            .with_condition(Some(condition.clone()));
        if !validate_fulfilment(envelope.inbound_protocol_state.as_ref(), &transfer_state)? {
            return Err(FspiopError::validation(
                "fulfilment does not match transfer condition",
            ));
        }
    }

    let mut body = json!({ "transferState": payload.transfer_state });
    if let Some(fulfilment) = &payload.fulfilment {
        body["fulfilment"] = json!(fulfilment);
    }
    if let Some(timestamp) = &payload.completed_timestamp {
        body["completedTimestamp"] = json!(timestamp);
    }
    if let Some(extension_list) = &payload.extension_list {
        body["extensionList"] = serde_json::to_value(extension_list)
            .map_err(|e| FspiopError::Internal(format!("transfer result body: {e}")))?;
    }

    let path = callback_path(
        CallbackResource::Transfers,
        None,
        &payload.transfer_id,
        None,
        CallbackOutcome::Success,
    );
    let request = OutboundRequest {
        url: callback_url(payer_endpoint, &path),
        method: HttpMethod::Put,
        headers: headers.clone(),
        source: None,
        destination: Some(payload.payer_fsp.clone()),
        payload: Some(body),
    };
    deliver(state, event, request).await
}

pub(crate) async fn handle_errored(state: &DispatcherState, envelope: &DomainEventEnvelope) {
    let event = EventName::TransferErrored;
    let EventPayload::TransferError(payload) = &envelope.payload else {
        return drop_mismatched_payload(event);
    };

    let payer_endpoint = match resolve_endpoint(state, &payload.payer_fsp).await {
        Ok(endpoint) => endpoint,
        Err(e) => return drop_unresolvable(event, &payload.payer_fsp, &e),
    };
    let headers = envelope.inbound_headers().cloned().unwrap_or_default();

    let result = async {
        envelope.validate_payload()?;
        validate_headers(CallbackResource::Transfers, false, &headers)?;
        let path = callback_path(
            CallbackResource::Transfers,
            None,
            &payload.transfer_id,
            None,
            CallbackOutcome::Error,
        );
        let request = OutboundRequest {
            url: callback_url(&payer_endpoint, &path),
            method: HttpMethod::Put,
            headers: headers.clone(),
            source: None,
            destination: Some(payload.payer_fsp.clone()),
            payload: Some(error_body(&payload.error_information)),
        };
        deliver(state, event, request).await
    }
    .await;

    if let Err(error) = result {
        // The flow already carries an error notice; a failure here gets a
        // generated one on the same template.
        let info = error_information(&error);
        let path = callback_path(
            CallbackResource::Transfers,
            None,
            &payload.transfer_id,
            None,
            CallbackOutcome::Error,
        );
        let request = OutboundRequest {
            url: callback_url(&payer_endpoint, &path),
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

async fn send_error_to_payer(
    state: &DispatcherState,
    event: EventName,
    payer_fsp: &str,
    transfer_id: &str,
    headers: &FspiopHeaders,
    error: &FspiopError,
) {
    let payer_endpoint = match resolve_endpoint(state, payer_fsp).await {
        Ok(endpoint) => endpoint,
        Err(e) => return drop_unresolvable(event, payer_fsp, &e),
    };

    let info = error_information(error);
    let path = callback_path(
        CallbackResource::Transfers,
        None,
        transfer_id,
        None,
        CallbackOutcome::Error,
    );
    let request = OutboundRequest {
        url: callback_url(&payer_endpoint, &path),
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
