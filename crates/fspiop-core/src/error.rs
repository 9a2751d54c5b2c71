use thiserror::Error;

use crate::envelope::ExtensionList;

/// Errors raised across the gateway core.
///
/// The three failure categories the dispatcher distinguishes are carried by
/// type, not by message: malformed input ([`Self::MalformedSyntax`],
/// [`Self::HeaderValidation`]), business validation ([`Self::Validation`],
/// the crypto variants), and terminal participant resolution
/// ([`Self::ParticipantNotFound`], [`Self::EndpointNotFound`]).
#[derive(Debug, Error)]
pub enum FspiopError {
    #[error("invalid preimage length: expected 32 bytes, got {0}")]
    InvalidPreimageLength(usize),

    #[error("unable to validate fulfilment")]
    UnableToValidateFulfilment,

    #[error("missing or invalid headers: {0}")]
    HeaderValidation(String),

    #[error("malformed syntax")]
    MalformedSyntax,

    #[error("{description}")]
    Validation {
        code: String,
        description: String,
        extension_list: Option<ExtensionList>,
    },

    #[error("participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("no FSPIOP endpoint for participant: {0}")]
    EndpointNotFound(String),

    #[error("{0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FspiopError {
    /// Shorthand for a business-rule violation with the generic
    /// validation code.
    pub fn validation(description: impl Into<String>) -> Self {
        FspiopError::Validation {
            code: crate::constants::ERR_VALIDATION.to_string(),
            description: description.into(),
            extension_list: None,
        }
    }

    /// Whether this failure is terminal for the dispatcher: there is no
    /// known address to deliver an error callback to.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            FspiopError::ParticipantNotFound(_) | FspiopError::EndpointNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_failures_are_terminal() {
        assert!(FspiopError::ParticipantNotFound("dfsp1".into()).is_resolution_failure());
        assert!(FspiopError::EndpointNotFound("dfsp1".into()).is_resolution_failure());
        assert!(!FspiopError::MalformedSyntax.is_resolution_failure());
        assert!(!FspiopError::validation("bad amount").is_resolution_failure());
    }

    #[test]
    fn test_validation_display_is_description_only() {
        let err = FspiopError::validation("amount precision exceeds 4 decimal places");
        assert_eq!(err.to_string(), "amount precision exceeds 4 decimal places");
    }
}
