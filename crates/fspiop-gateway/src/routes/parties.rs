use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use fspiop_core::{
    EventName, EventPayload, PartyInfoPayload, PartyResultPayload, ProtocolState,
};

use crate::error::GatewayError;
use crate::ingress::{
    accepted, acknowledged, extract_headers, malformed, publish, require_non_empty,
    require_source, validation_failure, verify_jws,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartyResultRequest {
    #[serde(default)]
    party: Option<serde_json::Value>,
}

/// GET: fan a lookup out to the party's owning FSP.
async fn ingest_lookup(
    req: &HttpRequest,
    state: &AppState,
    party_id_type: String,
    party_id: String,
    party_sub_id: Option<String>,
) -> Result<HttpResponse, GatewayError> {
    let event = EventName::PartyInfoRequested;
    let headers = extract_headers(req);
    let source = require_source(&headers, event)?;
    require_non_empty(&party_id_type, event)?;
    require_non_empty(&party_id, event)?;

    state
        .validator
        .validate_party_id_type(&party_id_type)
        .map_err(|e| validation_failure(e, event))?;

    let payload = PartyInfoPayload {
        party_id_type,
        party_id,
        party_sub_id,
        requester_fsp: source,
        destination_fsp: headers
            .destination()
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    };

    publish(
        state,
        event,
        EventPayload::PartyInfo(payload),
        Some(ProtocolState::fspiop(headers)),
    )
    .await?;

    Ok(accepted())
}

/// PUT: the owning FSP reports the lookup result back.
async fn ingest_result(
    req: &HttpRequest,
    state: &AppState,
    party_id_type: String,
    party_id: String,
    party_sub_id: Option<String>,
    body: PartyResultRequest,
) -> Result<HttpResponse, GatewayError> {
    let event = EventName::PartyQueryResponse;
    let headers = extract_headers(req);
    let source = require_source(&headers, event)?;
    require_non_empty(&party_id_type, event)?;
    require_non_empty(&party_id, event)?;

    let party = body.party.ok_or_else(|| malformed(event))?;

    let payload = PartyResultPayload {
        party_id_type,
        party_id,
        party_sub_id,
        owner_fsp: source,
        party,
    };

    let body_json =
        serde_json::to_value(&payload).map_err(|e| GatewayError::Internal(e.to_string()))?;
    verify_jws(state, &headers, &body_json, event)?;

    publish(
        state,
        event,
        EventPayload::PartyResult(payload),
        Some(ProtocolState::fspiop(headers)),
    )
    .await?;

    Ok(acknowledged())
}

/// GET /parties/{type}/{id} - look a party up
async fn lookup(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id) = path.into_inner();
    ingest_lookup(&req, &state, party_id_type, party_id, None).await
}

/// GET /parties/{type}/{id}/{subId}
async fn lookup_sub_id(
    req: HttpRequest,
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id, sub_id) = path.into_inner();
    ingest_lookup(&req, &state, party_id_type, party_id, Some(sub_id)).await
}

/// PUT /parties/{type}/{id} - report a lookup result
async fn result(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<PartyResultRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id) = path.into_inner();
    ingest_result(&req, &state, party_id_type, party_id, None, body.into_inner()).await
}

/// PUT /parties/{type}/{id}/{subId}
async fn result_sub_id(
    req: HttpRequest,
    path: web::Path<(String, String, String)>,
    body: web::Json<PartyResultRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id, sub_id) = path.into_inner();
    ingest_result(
        &req,
        &state,
        party_id_type,
        party_id,
        Some(sub_id),
        body.into_inner(),
    )
    .await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/parties/{type}/{id}", web::get().to(lookup))
        .route("/parties/{type}/{id}/{subId}", web::get().to(lookup_sub_id))
        .route("/parties/{type}/{id}", web::put().to(result))
        .route("/parties/{type}/{id}/{subId}", web::put().to(result_sub_id));
}
