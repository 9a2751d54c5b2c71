use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use fspiop_core::{AssociationPayload, EventName, EventPayload, ProtocolState};

use crate::error::GatewayError;
use crate::ingress::{
    accepted, extract_headers, publish, require_non_empty, require_source, validation_failure,
    verify_jws,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssociationRequest {
    #[serde(default)]
    fsp_id: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

/// Shared implementation for create/remove with and without a sub-id.
async fn ingest_association(
    req: &HttpRequest,
    state: &AppState,
    event: EventName,
    party_id_type: String,
    party_id: String,
    party_sub_id: Option<String>,
    body: AssociationRequest,
) -> Result<HttpResponse, GatewayError> {
    let headers = extract_headers(req);
    let source = require_source(&headers, event)?;
    require_non_empty(&party_id_type, event)?;
    require_non_empty(&party_id, event)?;

    state
        .validator
        .validate_party_id_type(&party_id_type)
        .map_err(|e| validation_failure(e, event))?;

    let payload = AssociationPayload {
        party_id_type,
        party_id,
        party_sub_id,
        // An explicit fspId in the body wins; otherwise the association is
        // for the caller itself.
        requester_fsp: body.fsp_id.filter(|f| !f.is_empty()).unwrap_or(source),
        currency: body.currency,
    };

    let body_json =
        serde_json::to_value(&payload).map_err(|e| GatewayError::Internal(e.to_string()))?;
    verify_jws(state, &headers, &body_json, event)?;

    let protocol_state = ProtocolState::fspiop(headers);

    publish(
        state,
        event,
        EventPayload::Association(payload),
        Some(protocol_state),
    )
    .await?;

    Ok(accepted())
}

/// POST /participants/{type}/{id} - create an association
async fn create(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<AssociationRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id) = path.into_inner();
    ingest_association(
        &req,
        &state,
        EventName::AssociationCreated,
        party_id_type,
        party_id,
        None,
        body.into_inner(),
    )
    .await
}

/// POST /participants/{type}/{id}/{subId} - create a sub-id association
async fn create_sub_id(
    req: HttpRequest,
    path: web::Path<(String, String, String)>,
    body: web::Json<AssociationRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id, sub_id) = path.into_inner();
    ingest_association(
        &req,
        &state,
        EventName::AssociationCreated,
        party_id_type,
        party_id,
        Some(sub_id),
        body.into_inner(),
    )
    .await
}

/// DELETE /participants/{type}/{id} - remove an association
async fn remove(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id) = path.into_inner();
    ingest_association(
        &req,
        &state,
        EventName::AssociationRemoved,
        party_id_type,
        party_id,
        None,
        AssociationRequest::default(),
    )
    .await
}

/// DELETE /participants/{type}/{id}/{subId} - remove a sub-id association
async fn remove_sub_id(
    req: HttpRequest,
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (party_id_type, party_id, sub_id) = path.into_inner();
    ingest_association(
        &req,
        &state,
        EventName::AssociationRemoved,
        party_id_type,
        party_id,
        Some(sub_id),
        AssociationRequest::default(),
    )
    .await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/participants/{type}/{id}", web::post().to(create))
        .route(
            "/participants/{type}/{id}/{subId}",
            web::post().to(create_sub_id),
        )
        .route("/participants/{type}/{id}", web::delete().to(remove))
        .route(
            "/participants/{type}/{id}/{subId}",
            web::delete().to(remove_sub_id),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use std::sync::Arc;

    use fspiop_core::bus::InMemoryBus;
    use fspiop_core::{EventConsumer, InMemoryConsumer};

    use crate::config::GatewayConfig;
    use crate::ingress::json_config;

    fn test_state() -> (web::Data<AppState>, InMemoryConsumer) {
        let config = GatewayConfig {
            port: 0,
            switch_fsp_id: "switch".into(),
            currencies: vec!["USD".into()],
            jws_enabled: false,
            rate_limit_rpm: 600,
            bus_capacity: 16,
            directory_url: None,
            participant_endpoints: Vec::new(),
        };
        let (producer, consumer) = InMemoryBus::channel(16);
        (
            web::Data::new(AppState::new(config, Arc::new(producer))),
            consumer,
        )
    }

    #[actix_web::test]
    async fn test_create_association_is_202() {
        let (state, mut consumer) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/participants/MSISDN/27713803912")
            .insert_header(("fspiop-source", "dfsp1"))
            .set_json(serde_json::json!({ "fspId": "dfsp1", "currency": "USD" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 202);

        let envelope = consumer.next().await.unwrap();
        assert_eq!(envelope.name, "association-created");
        match envelope.payload {
            EventPayload::Association(p) => {
                assert_eq!(p.requester_fsp, "dfsp1");
                assert_eq!(p.party_sub_id, None);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_remove_association_with_sub_id() {
        let (state, mut consumer) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri("/participants/MSISDN/27713803912/wallet")
            .insert_header(("fspiop-source", "dfsp1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 202);

        let envelope = consumer.next().await.unwrap();
        assert_eq!(envelope.name, "association-removed");
        match envelope.payload {
            EventPayload::Association(p) => assert_eq!(p.party_sub_id.as_deref(), Some("wallet")),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_unknown_party_id_type_is_validation_error() {
        let (state, _consumer) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/participants/PASSPORT/x-1")
            .insert_header(("fspiop-source", "dfsp1"))
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["errorInformation"]["errorCode"], "3100");
    }

    #[actix_web::test]
    async fn test_missing_source_is_3101() {
        let (state, _consumer) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/participants/MSISDN/27713803912")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["errorInformation"]["errorCode"], "3101");
    }
}
