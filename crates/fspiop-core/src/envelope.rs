//! Domain event envelope and the payloads it carries.
//!
//! The envelope is created fresh at HTTP ingress, published to the bus,
//! consumed by the dispatcher and re-emitted as an outbound callback. It is
//! never persisted. Protocol-carried state (headers, ILP packet, condition,
//! fulfilment, extensions) travels in a tagged [`ProtocolState`] keyed by
//! protocol-version tag; consumers pattern-match on the tag instead of
//! probing for optional fields.

use serde::{Deserialize, Serialize};

use crate::constants::{CONDITION_LEN, PROTOCOL_TYPE_FSPIOP};
use crate::error::FspiopError;
use crate::headers::FspiopHeaders;

/// Closed set of domain event variants.
///
/// Wire names are kebab-case; an unrecognized wire name is a distinct,
/// explicit case for the dispatcher (logged and skipped, never an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    AssociationCreated,
    AssociationRemoved,
    PartyInfoRequested,
    PartyQueryResponse,
    TransferPrepared,
    TransferFulfilled,
    TransferErrored,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::AssociationCreated => "association-created",
            EventName::AssociationRemoved => "association-removed",
            EventName::PartyInfoRequested => "party-info-requested",
            EventName::PartyQueryResponse => "party-query-response",
            EventName::TransferPrepared => "transfer-prepared",
            EventName::TransferFulfilled => "transfer-fulfilled",
            EventName::TransferErrored => "transfer-errored",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "association-created" => Some(EventName::AssociationCreated),
            "association-removed" => Some(EventName::AssociationRemoved),
            "party-info-requested" => Some(EventName::PartyInfoRequested),
            "party-query-response" => Some(EventName::PartyQueryResponse),
            "transfer-prepared" => Some(EventName::TransferPrepared),
            "transfer-fulfilled" => Some(EventName::TransferFulfilled),
            "transfer-errored" => Some(EventName::TransferErrored),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionList {
    pub extension: Vec<Extension>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub currency: String,
    pub amount: String,
}

/// Structured error notice carried by `transfer-errored` events and
/// outbound error callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInformation {
    pub error_code: String,
    pub error_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

/// Participant association create/remove request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationPayload {
    pub party_id_type: String,
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_sub_id: Option<String>,
    /// FSP that asked for the association; the confirmation callback is
    /// self-addressed to it.
    pub requester_fsp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Party lookup request on behalf of the requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfoPayload {
    pub party_id_type: String,
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_sub_id: Option<String>,
    pub requester_fsp: String,
    /// FSP the lookup is directed at, when the requester named one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_fsp: Option<String>,
}

/// Party lookup result reported by the owning FSP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyResultPayload {
    pub party_id_type: String,
    pub party_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_sub_id: Option<String>,
    /// FSP that owns the party record.
    pub owner_fsp: String,
    pub party: serde_json::Value,
}

/// Transfer prepare request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPreparePayload {
    pub transfer_id: String,
    pub payer_fsp: String,
    pub payee_fsp: String,
    pub amount: Money,
    pub ilp_packet: String,
    pub condition: String,
    pub expiration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

/// Transfer fulfil result. `condition` is the prepare-leg condition the
/// settlement context attaches so the dispatcher can check the fulfilment
/// without holding transfer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResultPayload {
    pub transfer_id: String,
    pub payer_fsp: String,
    pub transfer_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

/// Transfer failure notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferErrorPayload {
    pub transfer_id: String,
    pub payer_fsp: String,
    pub error_information: ErrorInformation,
}

/// Business data of a domain event, one variant per event family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventPayload {
    Association(AssociationPayload),
    PartyInfo(PartyInfoPayload),
    PartyResult(PartyResultPayload),
    TransferPrepare(TransferPreparePayload),
    TransferResult(TransferResultPayload),
    TransferError(TransferErrorPayload),
}

/// Protocol-specific carry-through state, keyed by protocol-version tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol")]
pub enum ProtocolState {
    #[serde(rename = "fspiop-v1.1", rename_all = "camelCase")]
    Fspiop {
        headers: FspiopHeaders,
        #[serde(skip_serializing_if = "Option::is_none")]
        ilp_packet: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fulfilment: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        extension_list: Option<ExtensionList>,
    },
}

impl ProtocolState {
    /// State carrying headers only.
    pub fn fspiop(headers: FspiopHeaders) -> Self {
        ProtocolState::Fspiop {
            headers,
            ilp_packet: None,
            condition: None,
            fulfilment: None,
            extension_list: None,
        }
    }

    pub fn with_condition(mut self, value: Option<String>) -> Self {
        let ProtocolState::Fspiop { condition, .. } = &mut self;
        *condition = value;
        self
    }

    pub fn with_fulfilment(mut self, value: Option<String>) -> Self {
        let ProtocolState::Fspiop { fulfilment, .. } = &mut self;
        *fulfilment = value;
        self
    }

    pub fn with_ilp_packet(mut self, value: Option<String>) -> Self {
        let ProtocolState::Fspiop { ilp_packet, .. } = &mut self;
        *ilp_packet = value;
        self
    }

    pub fn headers(&self) -> &FspiopHeaders {
        let ProtocolState::Fspiop { headers, .. } = self;
        headers
    }

    pub fn condition(&self) -> Option<&str> {
        let ProtocolState::Fspiop { condition, .. } = self;
        condition.as_deref()
    }

    pub fn fulfilment(&self) -> Option<&str> {
        let ProtocolState::Fspiop { fulfilment, .. } = self;
        fulfilment.as_deref()
    }
}

/// Trace propagation carrier attached at ingress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingInfo {
    pub trace_id: String,
    pub span_id: String,
}

impl TracingInfo {
    /// Fresh ids for a new ingress request.
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().simple().to_string(),
            span_id: uuid::Uuid::new_v4().simple().to_string()[..16].to_string(),
        }
    }
}

impl Default for TracingInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// The unit of work flowing from HTTP ingress to outbound callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEventEnvelope {
    /// Wire tag identifying the event variant; see [`EventName`].
    pub name: String,
    pub payload: EventPayload,
    pub inbound_protocol_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound_protocol_state: Option<ProtocolState>,
    pub tracing_info: TracingInfo,
}

impl DomainEventEnvelope {
    pub fn new(
        name: EventName,
        payload: EventPayload,
        inbound_protocol_state: Option<ProtocolState>,
    ) -> Self {
        Self {
            name: name.as_str().to_string(),
            payload,
            inbound_protocol_type: PROTOCOL_TYPE_FSPIOP.to_string(),
            inbound_protocol_state,
            tracing_info: TracingInfo::new(),
        }
    }

    /// Headers carried through from ingress, if any.
    pub fn inbound_headers(&self) -> Option<&FspiopHeaders> {
        self.inbound_protocol_state.as_ref().map(ProtocolState::headers)
    }

    /// Self-check that the payload matches its own schema and agrees with
    /// the event name. A failure here is a programming-contract violation,
    /// not a caller error.
    pub fn validate_payload(&self) -> Result<(), FspiopError> {
        let contract = |msg: &str| FspiopError::Internal(format!("envelope contract: {msg}"));

        let name = EventName::from_name(&self.name)
            .ok_or_else(|| contract(&format!("unknown event name '{}'", self.name)))?;

        match (&name, &self.payload) {
            (
                EventName::AssociationCreated | EventName::AssociationRemoved,
                EventPayload::Association(p),
            ) => {
                if p.party_id_type.is_empty() || p.party_id.is_empty() {
                    return Err(contract("association payload missing party identifier"));
                }
                if p.requester_fsp.is_empty() {
                    return Err(contract("association payload missing requester FSP"));
                }
            }
            (EventName::PartyInfoRequested, EventPayload::PartyInfo(p)) => {
                if p.party_id_type.is_empty() || p.party_id.is_empty() {
                    return Err(contract("party info payload missing party identifier"));
                }
                if p.requester_fsp.is_empty() {
                    return Err(contract("party info payload missing requester FSP"));
                }
            }
            (EventName::PartyQueryResponse, EventPayload::PartyResult(p)) => {
                if p.party_id_type.is_empty() || p.party_id.is_empty() {
                    return Err(contract("party result payload missing party identifier"));
                }
                if p.owner_fsp.is_empty() {
                    return Err(contract("party result payload missing owner FSP"));
                }
            }
            (EventName::TransferPrepared, EventPayload::TransferPrepare(p)) => {
                if p.transfer_id.is_empty() || p.payer_fsp.is_empty() || p.payee_fsp.is_empty() {
                    return Err(contract("transfer prepare payload missing identity fields"));
                }
                if p.condition.len() != CONDITION_LEN {
                    return Err(contract("transfer prepare condition is not 43 characters"));
                }
                if p.ilp_packet.is_empty() {
                    return Err(contract("transfer prepare payload missing ILP packet"));
                }
            }
            (EventName::TransferFulfilled, EventPayload::TransferResult(p)) => {
                if p.transfer_id.is_empty() || p.payer_fsp.is_empty() {
                    return Err(contract("transfer result payload missing identity fields"));
                }
                if p.transfer_state.is_empty() {
                    return Err(contract("transfer result payload missing transfer state"));
                }
            }
            (EventName::TransferErrored, EventPayload::TransferError(p)) => {
                if p.transfer_id.is_empty() || p.payer_fsp.is_empty() {
                    return Err(contract("transfer error payload missing identity fields"));
                }
                if p.error_information.error_code.is_empty() {
                    return Err(contract("transfer error payload missing error code"));
                }
            }
            _ => {
                return Err(contract(&format!(
                    "payload variant does not match event '{}'",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn association_envelope() -> DomainEventEnvelope {
        DomainEventEnvelope::new(
            EventName::AssociationCreated,
            EventPayload::Association(AssociationPayload {
                party_id_type: "MSISDN".into(),
                party_id: "27713803912".into(),
                party_sub_id: None,
                requester_fsp: "dfsp1".into(),
                currency: Some("USD".into()),
            }),
            None,
        )
    }

    #[test]
    fn test_event_name_round_trip() {
        for name in [
            EventName::AssociationCreated,
            EventName::AssociationRemoved,
            EventName::PartyInfoRequested,
            EventName::PartyQueryResponse,
            EventName::TransferPrepared,
            EventName::TransferFulfilled,
            EventName::TransferErrored,
        ] {
            assert_eq!(EventName::from_name(name.as_str()), Some(name));
        }
        assert_eq!(EventName::from_name("quote-requested"), None);
    }

    #[test]
    fn test_validate_payload_accepts_well_formed() {
        assert!(association_envelope().validate_payload().is_ok());
    }

    #[test]
    fn test_validate_payload_rejects_name_mismatch() {
        let mut envelope = association_envelope();
        envelope.name = EventName::TransferPrepared.as_str().to_string();
        assert!(envelope.validate_payload().is_err());
    }

    #[test]
    fn test_validate_payload_rejects_unknown_name() {
        let mut envelope = association_envelope();
        envelope.name = "mystery-event".into();
        assert!(envelope.validate_payload().is_err());
    }

    #[test]
    fn test_validate_payload_rejects_short_condition() {
        let envelope = DomainEventEnvelope::new(
            EventName::TransferPrepared,
            EventPayload::TransferPrepare(TransferPreparePayload {
                transfer_id: "t1".into(),
                payer_fsp: "dfsp1".into(),
                payee_fsp: "dfsp2".into(),
                amount: Money {
                    currency: "USD".into(),
                    amount: "100.00".into(),
                },
                ilp_packet: "AQAAAAA".into(),
                condition: "short".into(),
                expiration: "2030-01-01T00:00:00.000Z".into(),
                extension_list: None,
            }),
            None,
        );
        assert!(envelope.validate_payload().is_err());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = association_envelope();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["name"], "association-created");
        assert_eq!(json["inboundProtocolType"], "fspiop-v1.1");
        assert_eq!(json["payload"]["kind"], "association");
        assert_eq!(json["payload"]["partyIdType"], "MSISDN");
        let back: DomainEventEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_protocol_state_tagged_by_version() {
        let state = ProtocolState::fspiop(FspiopHeaders::new())
            .with_condition(Some("c".repeat(43)))
            .with_fulfilment(Some("f".into()));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["protocol"], "fspiop-v1.1");
        assert_eq!(json["fulfilment"], "f");
        assert!(json.get("ilpPacket").is_none());
    }
}
