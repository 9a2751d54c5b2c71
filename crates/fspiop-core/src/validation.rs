//! Standard business-rule validator.
//!
//! Covers the resource-specific checks the entry adapter delegates:
//! currency allow-list, amount decimal precision, condition/fulfilment
//! format and the ILP packet presence cross-check. Violations surface as
//! structured [`FspiopError::Validation`] values that pass through to the
//! HTTP error envelope unchanged.

use crate::constants::{CONDITION_LEN, DEFAULT_CURRENCIES, MAX_AMOUNT_DECIMALS, PARTY_ID_TYPES};
use crate::collaborators::PayloadValidator;
use crate::crypto::derive_condition;
use crate::envelope::{TransferPreparePayload, TransferResultPayload};
use crate::error::FspiopError;

#[derive(Debug, Clone)]
pub struct StandardValidator {
    currencies: Vec<String>,
}

impl StandardValidator {
    pub fn new(currencies: Vec<String>) -> Self {
        Self { currencies }
    }

    fn check_currency(&self, currency: &str) -> Result<(), FspiopError> {
        if self.currencies.iter().any(|c| c == currency) {
            Ok(())
        } else {
            Err(FspiopError::validation(format!(
                "currency {currency} is not supported"
            )))
        }
    }

    fn check_amount(&self, amount: &str) -> Result<(), FspiopError> {
        let value: f64 = amount
            .parse()
            .map_err(|_| FspiopError::validation(format!("amount {amount} is not a number")))?;
        if value <= 0.0 {
            return Err(FspiopError::validation("amount must be positive"));
        }
        if let Some((_, decimals)) = amount.split_once('.') {
            if decimals.len() > MAX_AMOUNT_DECIMALS {
                return Err(FspiopError::validation(format!(
                    "amount precision exceeds {MAX_AMOUNT_DECIMALS} decimal places"
                )));
            }
        }
        Ok(())
    }

    fn check_condition_format(&self, condition: &str) -> Result<(), FspiopError> {
        let well_formed = condition.len() == CONDITION_LEN
            && condition
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if well_formed {
            Ok(())
        } else {
            Err(FspiopError::validation("condition is not a 43-character base64url digest"))
        }
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCIES.iter().map(|c| c.to_string()).collect())
    }
}

impl PayloadValidator for StandardValidator {
    fn validate_transfer_prepare(
        &self,
        payload: &TransferPreparePayload,
    ) -> Result<(), FspiopError> {
        self.check_currency(&payload.amount.currency)?;
        self.check_amount(&payload.amount.amount)?;
        self.check_condition_format(&payload.condition)?;
        // The ILP packet embeds payer/payee and amount; a packet that is
        // missing entirely can never cross-check against the body.
        if payload.ilp_packet.is_empty() {
            return Err(FspiopError::validation("ilpPacket must not be empty"));
        }
        Ok(())
    }

    fn validate_transfer_result(
        &self,
        payload: &TransferResultPayload,
    ) -> Result<(), FspiopError> {
        if let Some(fulfilment) = payload.fulfilment.as_deref() {
            // Format check only: the stateless gateway does not hold the
            // prepare-leg condition at ingress. Equality is checked by the
            // dispatcher when the event carries the condition.
            derive_condition(fulfilment).map(|_| ()).map_err(|e| match e {
                FspiopError::InvalidPreimageLength(n) => FspiopError::validation(format!(
                    "fulfilment must decode to 32 bytes, got {n}"
                )),
                _ => FspiopError::validation("fulfilment is not valid base64url"),
            })?;
        }
        Ok(())
    }

    fn validate_party_id_type(&self, party_id_type: &str) -> Result<(), FspiopError> {
        if PARTY_ID_TYPES.contains(&party_id_type) {
            Ok(())
        } else {
            Err(FspiopError::validation(format!(
                "party id type {party_id_type} is not supported"
            )))
        }
    }
}
