//! association-created / association-removed callbacks.
//!
//! The confirmation is self-addressed: the requester that asked for the
//! association receives the PUT. Headers are forwarded unmodified; no
//! switch-identity substitution on this flow.

use serde_json::json;

use fspiop_core::{
    callback_path, callback_url, validate_headers, AssociationPayload, CallbackOutcome,
    CallbackResource, DomainEventEnvelope, EventName, EventPayload, FspiopError, FspiopHeaders,
    HttpMethod, OutboundRequest,
};

use crate::state::DispatcherState;

use super::{
    deliver, drop_mismatched_payload, drop_unresolvable, error_body, error_information,
    resolve_endpoint,
};

pub(crate) async fn handle(
    state: &DispatcherState,
    event: EventName,
    envelope: &DomainEventEnvelope,
) {
    let EventPayload::Association(payload) = &envelope.payload else {
        return drop_mismatched_payload(event);
    };

    let endpoint = match resolve_endpoint(state, &payload.requester_fsp).await {
        Ok(endpoint) => endpoint,
        Err(e) => return drop_unresolvable(event, &payload.requester_fsp, &e),
    };
    let headers = envelope.inbound_headers().cloned().unwrap_or_default();

    if let Err(error) = attempt(state, event, envelope, payload, &endpoint, &headers).await {
        let info = error_information(&error);
        let path = callback_path(
            CallbackResource::Participants,
            Some(&payload.party_id_type),
            &payload.party_id,
            payload.party_sub_id.as_deref(),
            CallbackOutcome::Error,
        );
        let request = OutboundRequest {
            url: callback_url(&endpoint, &path),
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

async fn attempt(
    state: &DispatcherState,
    event: EventName,
    envelope: &DomainEventEnvelope,
    payload: &AssociationPayload,
    endpoint: &str,
    headers: &FspiopHeaders,
) -> Result<(), FspiopError> {
    envelope.validate_payload()?;
    validate_headers(
        CallbackResource::Participants,
        payload.party_sub_id.is_some(),
        headers,
    )?;

    let body = if event == EventName::AssociationRemoved {
        json!({ "fspId": serde_json::Value::Null })
    } else {
        let mut body = json!({ "fspId": payload.requester_fsp });
        if let Some(currency) = &payload.currency {
            body["currency"] = json!(currency);
        }
        body
    };

    let path = callback_path(
        CallbackResource::Participants,
        Some(&payload.party_id_type),
        &payload.party_id,
        payload.party_sub_id.as_deref(),
        CallbackOutcome::Success,
    );
    let request = OutboundRequest {
        url: callback_url(endpoint, &path),
        method: HttpMethod::Put,
        headers: headers.clone(),
        source: None,
        destination: None,
        payload: Some(body),
    };
    deliver(state, event, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use fspiop_core::ProtocolState;

    use crate::handlers::test_support::{inbound_headers, recording_state};

    fn envelope(
        event: EventName,
        sub_id: Option<&str>,
        headers: Option<FspiopHeaders>,
    ) -> DomainEventEnvelope {
        DomainEventEnvelope::new(
            event,
            EventPayload::Association(AssociationPayload {
                party_id_type: "MSISDN".into(),
                party_id: "27713803912".into(),
                party_sub_id: sub_id.map(String::from),
                requester_fsp: "dfsp1".into(),
                currency: Some("USD".into()),
            }),
            headers.map(ProtocolState::fspiop),
        )
    }

    #[tokio::test]
    async fn test_created_puts_confirmation_to_requester() {
        let (state, sender) = recording_state(&[("dfsp1", "http://dfsp1.example")]);
        let envelope = envelope(
            EventName::AssociationCreated,
            None,
            Some(inbound_headers("dfsp1", None)),
        );

        handle(&state, EventName::AssociationCreated, &envelope).await;

        let requests = sender.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://dfsp1.example/participants/MSISDN/27713803912"
        );
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert_eq!(requests[0].payload.as_ref().unwrap()["fspId"], "dfsp1");
        // headers forwarded unmodified
        assert_eq!(requests[0].headers.source(), Some("dfsp1"));
        assert_eq!(requests[0].source, None);
    }

    #[tokio::test]
    async fn test_removed_with_sub_id_uses_sub_id_template() {
        let (state, sender) = recording_state(&[("dfsp1", "http://dfsp1.example")]);
        let envelope = envelope(
            EventName::AssociationRemoved,
            Some("wallet"),
            Some(inbound_headers("dfsp1", None)),
        );

        handle(&state, EventName::AssociationRemoved, &envelope).await;

        let requests = sender.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://dfsp1.example/participants/MSISDN/27713803912/wallet"
        );
        assert!(requests[0].payload.as_ref().unwrap()["fspId"].is_null());
    }

    #[tokio::test]
    async fn test_unresolvable_requester_is_terminal_drop() {
        let (state, sender) = recording_state(&[]);
        let envelope = envelope(
            EventName::AssociationCreated,
            None,
            Some(inbound_headers("dfsp1", None)),
        );

        handle(&state, EventName::AssociationCreated, &envelope).await;

        assert!(sender.requests().is_empty());
    }

    #[tokio::test]
    async fn test_header_failure_sends_error_template() {
        let (state, sender) = recording_state(&[("dfsp1", "http://dfsp1.example")]);
        // no inbound protocol state at all: header validation must fail
        let envelope = envelope(EventName::AssociationCreated, None, None);

        handle(&state, EventName::AssociationCreated, &envelope).await;

        let requests = sender.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://dfsp1.example/participants/MSISDN/27713803912/error"
        );
        let body = requests[0].payload.as_ref().unwrap();
        assert_eq!(body["errorInformation"]["errorCode"], "3102");
    }

    #[tokio::test]
    async fn test_error_delivery_failure_is_only_logged() {
        use std::sync::Arc;

        use crate::directory::StaticParticipantDirectory;
        use crate::handlers::test_support::RecordingSender;
        use crate::state::DispatcherState;

        let sender = Arc::new(RecordingSender::failing());
        let state = DispatcherState::new(
            "switch",
            Arc::new(StaticParticipantDirectory::from_pairs(&[(
                "dfsp1".to_string(),
                "http://dfsp1.example".to_string(),
            )])),
            sender.clone(),
        );
        let envelope = envelope(EventName::AssociationCreated, None, None);

        // must not panic; both the attempt and the error delivery fail
        handle(&state, EventName::AssociationCreated, &envelope).await;
        assert_eq!(sender.requests().len(), 1);
    }
}
