//! Protocol constants shared by the entry adapter and the dispatcher.

/// Protocol-version tag carried in every envelope's `inboundProtocolType`.
pub const PROTOCOL_TYPE_FSPIOP: &str = "fspiop-v1.1";

/// Interledger preimages are fixed-size.
pub const PREIMAGE_LEN: usize = 32;

/// Unpadded base64url length of a 32-byte SHA-256 digest.
pub const CONDITION_LEN: usize = 43;

/// FSP identity the switch inserts as `fspiop-source` when relaying.
pub const DEFAULT_SWITCH_FSP_ID: &str = "switch";

// FSPIOP header names
pub const HDR_SOURCE: &str = "fspiop-source";
pub const HDR_DESTINATION: &str = "fspiop-destination";
pub const HDR_SIGNATURE: &str = "fspiop-signature";
pub const HDR_ACCEPT: &str = "accept";
pub const HDR_CONTENT_TYPE: &str = "content-type";
pub const HDR_DATE: &str = "date";

// FSPIOP error codes
pub const ERR_MALFORMED_SYNTAX: &str = "3101";
pub const ERR_MALFORMED_SYNTAX_MSG: &str = "Malformed syntax";
pub const ERR_MISSING_ELEMENT: &str = "3102";
pub const ERR_INTERNAL: &str = "2001";
pub const ERR_VALIDATION: &str = "3100";

/// Party identifier types the switch will relay query responses for.
pub const PARTY_ID_TYPES: &[&str] = &[
    "MSISDN",
    "EMAIL",
    "PERSONAL_ID",
    "BUSINESS",
    "DEVICE",
    "ACCOUNT_ID",
    "IBAN",
    "ALIAS",
];

/// Currencies accepted by the standard payload validator when no
/// allow-list is configured.
pub const DEFAULT_CURRENCIES: &[&str] = &["USD", "EUR", "XOF", "TZS", "ZMW"];

/// Maximum decimal places allowed in a transfer amount.
pub const MAX_AMOUNT_DECIMALS: usize = 4;
