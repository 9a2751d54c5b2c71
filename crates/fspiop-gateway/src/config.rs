use std::env;

use fspiop_core::{DEFAULT_CURRENCIES, DEFAULT_SWITCH_FSP_ID};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT_RPM: u32 = 600;
const DEFAULT_BUS_CAPACITY: usize = fspiop_core::DEFAULT_BUS_CAPACITY;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Server port
    pub port: u16,
    /// FSP identity the switch inserts when relaying party flows
    pub switch_fsp_id: String,
    /// Currency allow-list for transfer validation
    pub currencies: Vec<String>,
    /// Whether inbound JWS verification is enforced
    pub jws_enabled: bool,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u32,
    /// In-memory bus buffer size
    pub bus_capacity: usize,
    /// Participant directory base URL — if unset, the static env-configured
    /// directory is used
    pub directory_url: Option<String>,
    /// Static participant endpoints, `fsp=url` comma-separated
    pub participant_endpoints: Vec<(String, String)>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let switch_fsp_id =
            env::var("SWITCH_FSP_ID").unwrap_or_else(|_| DEFAULT_SWITCH_FSP_ID.to_string());
        if switch_fsp_id.is_empty() {
            return Err(ConfigError::InvalidValue("SWITCH_FSP_ID must not be empty"));
        }

        let currencies: Vec<String> = env::var("ALLOWED_CURRENCIES")
            .map(|s| {
                s.split(',')
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| DEFAULT_CURRENCIES.iter().map(|c| c.to_string()).collect());
        if currencies.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ALLOWED_CURRENCIES must name at least one currency",
            ));
        }

        let jws_enabled = env::var("JWS_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        let bus_capacity = env::var("BUS_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BUS_CAPACITY);

        let directory_url = env::var("PARTICIPANT_DIRECTORY_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let participant_endpoints = env::var("PARTICIPANT_ENDPOINTS")
            .ok()
            .map(|s| parse_endpoint_pairs(&s))
            .transpose()?
            .unwrap_or_default();

        if directory_url.is_none() && participant_endpoints.is_empty() {
            tracing::warn!(
                "neither PARTICIPANT_DIRECTORY_URL nor PARTICIPANT_ENDPOINTS is set — \
                 every callback will be dropped as unresolvable"
            );
        }

        Ok(Self {
            port,
            switch_fsp_id,
            currencies,
            jws_enabled,
            rate_limit_rpm,
            bus_capacity,
            directory_url,
            participant_endpoints,
        })
    }
}

/// Parse `fsp1=http://a,fsp2=http://b` pairs.
fn parse_endpoint_pairs(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(fsp, url)| (fsp.trim().to_string(), url.trim().to_string()))
                .filter(|(fsp, url)| !fsp.is_empty() && !url.is_empty())
                .ok_or(ConfigError::InvalidValue(
                    "PARTICIPANT_ENDPOINTS entries must be fsp=url",
                ))
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidValue(&'static str),
}
