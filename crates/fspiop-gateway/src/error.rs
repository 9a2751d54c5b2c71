use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use fspiop_core::envelope::ExtensionList;
use fspiop_core::{FspiopError, ERR_INTERNAL, ERR_MALFORMED_SYNTAX, ERR_MALFORMED_SYNTAX_MSG, ERR_MISSING_ELEMENT};

/// Ingress failures, normalized to the FSPIOP error envelope.
///
/// The entry adapter never leaks raw internal error types: everything maps
/// to a 400 or 500 with an `errorInformation` body.
#[derive(Debug)]
pub enum GatewayError {
    /// Missing or unparsable required fields — fixed code and message.
    MalformedSyntax,
    /// Required header missing or empty.
    HeaderValidation(String),
    /// Business-rule violation; the validator's structured error passes
    /// through unchanged.
    Validation {
        code: String,
        description: String,
        extension_list: Option<ExtensionList>,
    },
    /// Unexpected failure, including bus publish errors.
    Internal(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::MalformedSyntax => write!(f, "{ERR_MALFORMED_SYNTAX_MSG}"),
            GatewayError::HeaderValidation(msg) => write!(f, "missing or invalid headers: {msg}"),
            GatewayError::Validation { description, .. } => write!(f, "{description}"),
            GatewayError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<FspiopError> for GatewayError {
    fn from(e: FspiopError) -> Self {
        match e {
            FspiopError::MalformedSyntax => GatewayError::MalformedSyntax,
            FspiopError::HeaderValidation(msg) => GatewayError::HeaderValidation(msg),
            FspiopError::Validation {
                code,
                description,
                extension_list,
            } => GatewayError::Validation {
                code,
                description,
                extension_list,
            },
            // Crypto failures at ingress surface through the validator;
            // anything else here is unexpected.
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

fn error_body(
    code: &str,
    description: &str,
    extension_list: Option<&ExtensionList>,
) -> serde_json::Value {
    match extension_list {
        Some(list) => serde_json::json!({
            "errorInformation": {
                "errorCode": code,
                "errorDescription": description,
                "extensionList": list,
            }
        }),
        None => serde_json::json!({
            "errorInformation": {
                "errorCode": code,
                "errorDescription": description,
            }
        }),
    }
}

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        match self {
            GatewayError::MalformedSyntax => HttpResponse::BadRequest().json(error_body(
                ERR_MALFORMED_SYNTAX,
                ERR_MALFORMED_SYNTAX_MSG,
                None,
            )),
            GatewayError::HeaderValidation(msg) => {
                HttpResponse::BadRequest().json(error_body(ERR_MISSING_ELEMENT, msg, None))
            }
            GatewayError::Validation {
                code,
                description,
                extension_list,
            } => HttpResponse::BadRequest().json(error_body(
                code,
                description,
                extension_list.as_ref(),
            )),
            GatewayError::Internal(msg) => {
                tracing::error!(error = %msg, "ingress internal error");
                HttpResponse::InternalServerError().json(error_body(ERR_INTERNAL, msg, None))
            }
        }
    }
}
