//! Interledger condition/fulfilment commitment checks.
//!
//! A `condition` is the public SHA-256 digest of a 32-byte secret preimage
//! (the `fulfilment`). Both travel as unpadded base64url strings; a valid
//! condition is always exactly 43 characters.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::constants::PREIMAGE_LEN;
use crate::envelope::ProtocolState;
use crate::error::FspiopError;

/// Derive the condition digest for a fulfilment preimage.
///
/// Decodes the base64url fulfilment, requires exactly 32 raw bytes, hashes
/// with SHA-256 and re-encodes the digest as unpadded base64url. Pure and
/// deterministic; the result is always 43 characters.
pub fn derive_condition(fulfilment: &str) -> Result<String, FspiopError> {
    // Senders occasionally pad; the wire format is unpadded.
    let trimmed = fulfilment.trim_end_matches('=');
    let raw = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| FspiopError::Internal(format!("fulfilment is not valid base64url: {e}")))?;

    if raw.len() != PREIMAGE_LEN {
        return Err(FspiopError::InvalidPreimageLength(raw.len()));
    }

    let digest = Sha256::digest(&raw);
    Ok(URL_SAFE_NO_PAD.encode(digest))
}

/// Check a transfer's stored condition against a supplied fulfilment.
///
/// Returns `true` when there is nothing to check: no inbound state, or an
/// inbound state that carries no fulfilment (not every message does).
/// Otherwise the derived condition must equal the transfer's condition
/// exactly.
///
/// [`FspiopError::InvalidPreimageLength`] propagates unchanged; any other
/// failure is re-signaled as [`FspiopError::UnableToValidateFulfilment`]
/// so low-level error shapes never leak.
pub fn validate_fulfilment(
    inbound: Option<&ProtocolState>,
    transfer: &ProtocolState,
) -> Result<bool, FspiopError> {
    let Some(inbound) = inbound else {
        return Ok(true);
    };
    let Some(fulfilment) = inbound.fulfilment() else {
        return Ok(true);
    };

    match derive_condition(fulfilment) {
        Ok(derived) => Ok(transfer.condition() == Some(derived.as_str())),
        Err(e @ FspiopError::InvalidPreimageLength(_)) => Err(e),
        Err(_) => Err(FspiopError::UnableToValidateFulfilment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CONDITION_LEN;
    use crate::headers::FspiopHeaders;

    const FULFILMENT: &str = "FRzzxm0H2F_aIclc7pH4o18Ov-Cb4vSwOj67O-Zos_0";
    const CONDITION: &str = "HAgz1za3d1ExOAIHuiuqOV7pJD_dEOX00kslIr0ERYY";

    fn state(condition: Option<&str>, fulfilment: Option<&str>) -> ProtocolState {
        ProtocolState::Fspiop {
            headers: FspiopHeaders::new(),
            ilp_packet: None,
            condition: condition.map(String::from),
            fulfilment: fulfilment.map(String::from),
            extension_list: None,
        }
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(derive_condition(FULFILMENT).unwrap(), CONDITION);
    }

    #[test]
    fn test_condition_is_deterministic_and_43_chars() {
        for seed in 0u8..8 {
            let preimage = [seed; 32];
            let encoded = URL_SAFE_NO_PAD.encode(preimage);
            let first = derive_condition(&encoded).unwrap();
            let second = derive_condition(&encoded).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.len(), CONDITION_LEN);
        }
    }

    #[test]
    fn test_padded_input_is_tolerated() {
        let padded = format!("{FULFILMENT}=");
        assert_eq!(derive_condition(&padded).unwrap(), CONDITION);
    }

    #[test]
    fn test_wrong_preimage_length() {
        let short = URL_SAFE_NO_PAD.encode(b"too short");
        match derive_condition(&short) {
            Err(FspiopError::InvalidPreimageLength(n)) => assert_eq!(n, 9),
            other => panic!("expected InvalidPreimageLength, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_passes_without_inbound_state() {
        let transfer = state(Some(CONDITION), None);
        assert!(validate_fulfilment(None, &transfer).unwrap());
    }

    #[test]
    fn test_validate_passes_without_fulfilment() {
        let inbound = state(None, None);
        let transfer = state(Some(CONDITION), None);
        assert!(validate_fulfilment(Some(&inbound), &transfer).unwrap());
    }

    #[test]
    fn test_validate_matching_pair() {
        let inbound = state(None, Some(FULFILMENT));
        let transfer = state(Some(CONDITION), None);
        assert!(validate_fulfilment(Some(&inbound), &transfer).unwrap());
    }

    #[test]
    fn test_validate_mismatched_condition() {
        let inbound = state(None, Some(FULFILMENT));
        let transfer = state(Some("nope"), None);
        assert!(!validate_fulfilment(Some(&inbound), &transfer).unwrap());
    }

    #[test]
    fn test_validate_propagates_preimage_length() {
        let short = URL_SAFE_NO_PAD.encode(b"short");
        let inbound = state(None, Some(&short));
        let transfer = state(Some(CONDITION), None);
        match validate_fulfilment(Some(&inbound), &transfer) {
            Err(FspiopError::InvalidPreimageLength(_)) => {}
            other => panic!("expected InvalidPreimageLength, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_wraps_unexpected_failures() {
        let inbound = state(None, Some("!!! not base64url !!!"));
        let transfer = state(Some(CONDITION), None);
        match validate_fulfilment(Some(&inbound), &transfer) {
            Err(FspiopError::UnableToValidateFulfilment) => {}
            other => panic!("expected UnableToValidateFulfilment, got {other:?}"),
        }
    }
}
