//! FSPIOP header carriage and policy.
//!
//! Headers travel through the event pipeline as opaque state and are
//! replayed onto the outbound callback, so insertion order is preserved
//! and lookups are case-insensitive.

use serde::{Deserialize, Serialize};

use crate::constants::{HDR_CONTENT_TYPE, HDR_DATE, HDR_DESTINATION, HDR_SOURCE};
use crate::error::FspiopError;
use crate::template::CallbackResource;

/// Required header names, common to every resource and variant.
const REQUIRED_HEADERS: &[&str] = &[HDR_CONTENT_TYPE, HDR_DATE, HDR_SOURCE];

/// Insertion-ordered FSPIOP header map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FspiopHeaders(Vec<(String, String)>);

impl FspiopHeaders {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace in place if the name exists, otherwise append.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.get(HDR_SOURCE)
    }

    pub fn destination(&self) -> Option<&str> {
        self.get(HDR_DESTINATION)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Check the header map carries the required keys for a resource/variant.
///
/// Missing or empty keys are reported by name in a single
/// [`FspiopError::HeaderValidation`]. The ingress invariant that
/// `fspiop-source` is present and non-empty is enforced here.
pub fn validate_headers(
    resource: CallbackResource,
    has_sub_id: bool,
    headers: &FspiopHeaders,
) -> Result<(), FspiopError> {
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|name| headers.get(name).map_or(true, str::is_empty))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FspiopError::HeaderValidation(format!(
            "{} ({}{})",
            missing.join(", "),
            resource.as_str(),
            if has_sub_id { ", sub-id" } else { "" },
        )))
    }
}

/// Substitute the switch's identity on an outbound hop.
///
/// If `fspiop-destination` is absent or empty it becomes the original
/// `fspiop-source` (the reply is addressed back to whoever asked), then
/// `fspiop-source` becomes the switch's own FSP identity. Applied exactly
/// once per hop, and only on the party-info-request and party-query-response
/// forwarding paths.
pub fn apply_switch_identity(headers: &mut FspiopHeaders, switch_fsp_id: &str) {
    let source = headers.source().unwrap_or_default().to_string();
    if headers.destination().map_or(true, str::is_empty) {
        headers.set(HDR_DESTINATION, &source);
    }
    headers.set(HDR_SOURCE, switch_fsp_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_headers() -> FspiopHeaders {
        FspiopHeaders::from_pairs(vec![
            (
                "content-type".into(),
                "application/vnd.interoperability.transfers+json;version=1.1".into(),
            ),
            ("date".into(), "Thu, 24 Jan 2019 10:22:12 GMT".into()),
            ("fspiop-source".into(), "dfsp1".into()),
        ])
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let headers = base_headers();
        assert_eq!(headers.get("FSPIOP-Source"), Some("dfsp1"));
        assert_eq!(headers.get("Date"), Some("Thu, 24 Jan 2019 10:22:12 GMT"));
    }

    #[test]
    fn test_set_preserves_order() {
        let mut headers = base_headers();
        headers.set("FSPIOP-SOURCE", "dfsp9");
        let names: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["content-type", "date", "fspiop-source"]);
        assert_eq!(headers.source(), Some("dfsp9"));
    }

    #[test]
    fn test_validate_headers_passes() {
        assert!(validate_headers(CallbackResource::Transfers, false, &base_headers()).is_ok());
    }

    #[test]
    fn test_validate_headers_names_missing_keys() {
        let headers = FspiopHeaders::from_pairs(vec![("date".into(), "today".into())]);
        let err = validate_headers(CallbackResource::Parties, true, &headers).unwrap_err();
        match err {
            FspiopError::HeaderValidation(msg) => {
                assert!(msg.contains("content-type"));
                assert!(msg.contains("fspiop-source"));
                assert!(!msg.contains("date,"));
            }
            other => panic!("expected HeaderValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_headers_rejects_empty_source() {
        let mut headers = base_headers();
        headers.set("fspiop-source", "");
        assert!(validate_headers(CallbackResource::Participants, false, &headers).is_err());
    }

    #[test]
    fn test_switch_identity_defaults_destination_to_source() {
        let mut headers = FspiopHeaders::from_pairs(vec![("fspiop-source".into(), "A".into())]);
        apply_switch_identity(&mut headers, "switch");
        assert_eq!(headers.source(), Some("switch"));
        assert_eq!(headers.destination(), Some("A"));
    }

    #[test]
    fn test_switch_identity_keeps_existing_destination() {
        let mut headers = FspiopHeaders::from_pairs(vec![
            ("fspiop-source".into(), "A".into()),
            ("fspiop-destination".into(), "B".into()),
        ]);
        apply_switch_identity(&mut headers, "switch");
        assert_eq!(headers.source(), Some("switch"));
        assert_eq!(headers.destination(), Some("B"));
    }

    #[test]
    fn test_switch_identity_replaces_empty_destination() {
        let mut headers = FspiopHeaders::from_pairs(vec![
            ("fspiop-source".into(), "A".into()),
            ("fspiop-destination".into(), "".into()),
        ]);
        apply_switch_identity(&mut headers, "switch");
        assert_eq!(headers.destination(), Some("A"));
    }
}
