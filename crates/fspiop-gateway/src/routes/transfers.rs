use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use fspiop_core::{
    ErrorInformation, EventName, EventPayload, ExtensionList, Money, ProtocolState,
    TransferErrorPayload, TransferPreparePayload, TransferResultPayload, HDR_DESTINATION,
};

use crate::error::GatewayError;
use crate::ingress::{
    accepted, acknowledged, check_expiration, extract_headers, malformed, publish, require,
    require_non_empty, require_source, validation_failure, verify_jws,
};
use crate::state::AppState;

/// Prepare request body; every mandatory field optional at the wire so the
/// presence check owns the 3101 reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferPrepareRequest {
    transfer_id: Option<String>,
    payer_fsp: Option<String>,
    payee_fsp: Option<String>,
    amount: Option<Money>,
    ilp_packet: Option<String>,
    condition: Option<String>,
    expiration: Option<String>,
    extension_list: Option<ExtensionList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferFulfilRequest {
    transfer_state: Option<String>,
    fulfilment: Option<String>,
    condition: Option<String>,
    completed_timestamp: Option<String>,
    extension_list: Option<ExtensionList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferErrorRequest {
    error_information: Option<ErrorInformation>,
}

/// POST /transfers - ingest a transfer prepare
async fn prepare(
    req: HttpRequest,
    body: web::Json<TransferPrepareRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    const EVENT: EventName = EventName::TransferPrepared;

    let headers = extract_headers(&req);
    require_source(&headers, EVENT)?;

    let body = body.into_inner();
    let payload = TransferPreparePayload {
        transfer_id: require(body.transfer_id, EVENT)?,
        payer_fsp: require(body.payer_fsp, EVENT)?,
        payee_fsp: require(body.payee_fsp, EVENT)?,
        amount: body.amount.ok_or_else(|| malformed(EVENT))?,
        ilp_packet: require(body.ilp_packet, EVENT)?,
        condition: require(body.condition, EVENT)?,
        expiration: require(body.expiration, EVENT)?,
        extension_list: body.extension_list,
    };
    require_non_empty(&payload.amount.currency, EVENT)?;
    require_non_empty(&payload.amount.amount, EVENT)?;

    // Temporal check happens once, at ingress.
    check_expiration(&payload.expiration, EVENT)?;

    state
        .validator
        .validate_transfer_prepare(&payload)
        .map_err(|e| validation_failure(e, EVENT))?;

    let body_json =
        serde_json::to_value(&payload).map_err(|e| GatewayError::Internal(e.to_string()))?;
    verify_jws(&state, &headers, &body_json, EVENT)?;

    let protocol_state = ProtocolState::fspiop(headers)
        .with_ilp_packet(Some(payload.ilp_packet.clone()))
        .with_condition(Some(payload.condition.clone()));

    publish(
        &state,
        EVENT,
        EventPayload::TransferPrepare(payload),
        Some(protocol_state),
    )
    .await?;

    Ok(accepted())
}

/// PUT /transfers/{id} - ingest a transfer fulfil result
async fn fulfil(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<TransferFulfilRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    const EVENT: EventName = EventName::TransferFulfilled;

    let transfer_id = path.into_inner();
    let headers = extract_headers(&req);
    require_source(&headers, EVENT)?;
    require_non_empty(&transfer_id, EVENT)?;

    // The fulfil is addressed to the payer; a stateless gateway reads it
    // from the destination header.
    let payer_fsp = headers
        .get(HDR_DESTINATION)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .ok_or_else(|| malformed(EVENT))?;

    let body = body.into_inner();
    let payload = TransferResultPayload {
        transfer_id,
        payer_fsp,
        transfer_state: require(body.transfer_state, EVENT)?,
        fulfilment: body.fulfilment,
        condition: body.condition,
        completed_timestamp: body.completed_timestamp,
        extension_list: body.extension_list,
    };

    state
        .validator
        .validate_transfer_result(&payload)
        .map_err(|e| validation_failure(e, EVENT))?;

    let body_json =
        serde_json::to_value(&payload).map_err(|e| GatewayError::Internal(e.to_string()))?;
    verify_jws(&state, &headers, &body_json, EVENT)?;

    let protocol_state =
        ProtocolState::fspiop(headers).with_fulfilment(payload.fulfilment.clone());

    publish(
        &state,
        EVENT,
        EventPayload::TransferResult(payload),
        Some(protocol_state),
    )
    .await?;

    Ok(acknowledged())
}

/// PUT /transfers/{id}/error - ingest a transfer failure notice
async fn error(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<TransferErrorRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    const EVENT: EventName = EventName::TransferErrored;

    let transfer_id = path.into_inner();
    let headers = extract_headers(&req);
    require_source(&headers, EVENT)?;
    require_non_empty(&transfer_id, EVENT)?;

    let payer_fsp = headers
        .get(HDR_DESTINATION)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .ok_or_else(|| malformed(EVENT))?;

    let error_information = body
        .into_inner()
        .error_information
        .ok_or_else(|| malformed(EVENT))?;
    require_non_empty(&error_information.error_code, EVENT)?;

    let payload = TransferErrorPayload {
        transfer_id,
        payer_fsp,
        error_information,
    };

    let body_json =
        serde_json::to_value(&payload).map_err(|e| GatewayError::Internal(e.to_string()))?;
    verify_jws(&state, &headers, &body_json, EVENT)?;

    let protocol_state = ProtocolState::fspiop(headers);

    publish(
        &state,
        EVENT,
        EventPayload::TransferError(payload),
        Some(protocol_state),
    )
    .await?;

    Ok(acknowledged())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/transfers", web::post().to(prepare))
        .route("/transfers/{id}", web::put().to(fulfil))
        .route("/transfers/{id}/error", web::put().to(error));
}
