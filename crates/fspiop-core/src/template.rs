//! Outbound callback URL templates.
//!
//! Every resource has two template variants: *success* (deliver the result)
//! and *error* (deliver a failure notice). Selection is deterministic: the
//! presence of a sub-identifier selects the sub-id form, the outcome selects
//! success vs. error.

/// Resources the gateway issues callbacks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResource {
    Participants,
    Parties,
    Transfers,
}

impl CallbackResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackResource::Participants => "participants",
            CallbackResource::Parties => "parties",
            CallbackResource::Transfers => "transfers",
        }
    }

    /// Whether the resource path carries a party-id-type segment.
    fn has_type_segment(&self) -> bool {
        matches!(
            self,
            CallbackResource::Participants | CallbackResource::Parties
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success,
    Error,
}

/// Build the callback path for a resource, id and optional sub-id.
///
/// `party_id_type` is required for participants/parties and ignored for
/// transfers. Error outcome appends `/error`.
pub fn callback_path(
    resource: CallbackResource,
    party_id_type: Option<&str>,
    id: &str,
    sub_id: Option<&str>,
    outcome: CallbackOutcome,
) -> String {
    let mut path = format!("/{}", resource.as_str());
    if resource.has_type_segment() {
        path.push('/');
        path.push_str(party_id_type.unwrap_or_default());
    }
    path.push('/');
    path.push_str(id);
    if let Some(sub_id) = sub_id {
        path.push('/');
        path.push_str(sub_id);
    }
    if outcome == CallbackOutcome::Error {
        path.push_str("/error");
    }
    path
}

/// Join a participant endpoint base URL with a callback path.
pub fn callback_url(endpoint_base: &str, path: &str) -> String {
    format!("{}{}", endpoint_base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_without_sub_id() {
        let path = callback_path(
            CallbackResource::Parties,
            Some("MSISDN"),
            "27713803912",
            None,
            CallbackOutcome::Success,
        );
        assert_eq!(path, "/parties/MSISDN/27713803912");
    }

    #[test]
    fn test_sub_id_selects_sub_id_variant() {
        let path = callback_path(
            CallbackResource::Participants,
            Some("MSISDN"),
            "27713803912",
            Some("wallet"),
            CallbackOutcome::Error,
        );
        assert_eq!(path, "/participants/MSISDN/27713803912/wallet/error");
    }

    #[test]
    fn test_transfers_have_no_type_segment() {
        let success = callback_path(
            CallbackResource::Transfers,
            None,
            "t-1",
            None,
            CallbackOutcome::Success,
        );
        let error = callback_path(
            CallbackResource::Transfers,
            None,
            "t-1",
            None,
            CallbackOutcome::Error,
        );
        assert_eq!(success, "/transfers/t-1");
        assert_eq!(error, "/transfers/t-1/error");
    }

    #[test]
    fn test_callback_url_trims_trailing_slash() {
        assert_eq!(
            callback_url("http://dfsp1.example/", "/transfers/t-1"),
            "http://dfsp1.example/transfers/t-1"
        );
        assert_eq!(
            callback_url("http://dfsp1.example", "/transfers/t-1"),
            "http://dfsp1.example/transfers/t-1"
        );
    }
}
