use crate::utils::error::{CarrierError, Result};
use crate::utils::validation::{
    validate_optional_url, validate_range, validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};

const MAX_TIMEOUT_SECONDS: u64 = 300;

fn validate_timeout(field: &str, timeout: Option<u64>) -> Result<()> {
    match timeout {
        Some(seconds) => validate_range(field, seconds, 1, MAX_TIMEOUT_SECONDS),
        None => Ok(()),
    }
}

/// FedEx web-services credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FedExConfig {
    /// Developer key.
    pub key: String,
    pub password: String,
    pub account: String,
    /// Meter number.
    pub meter: String,
    #[serde(default)]
    pub test: bool,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Email notifications attached to every shipment.
    #[serde(default)]
    pub notifications: Vec<EmailNotification>,
    pub notification_aggregation_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailNotification {
    pub address: String,
    #[serde(default)]
    pub on_delivery: bool,
    #[serde(default)]
    pub on_exception: bool,
    #[serde(default)]
    pub on_shipment: bool,
    #[serde(default)]
    pub on_tender: bool,
    /// HTML, TEXT or WIRELESS; HTML when unset.
    pub format: Option<String>,
    /// EN when unset.
    pub language: Option<String>,
    pub locale_code: Option<String>,
}

impl Validate for FedExConfig {
    fn validate(&self) -> Result<()> {
        validate_required_field("fedex.key", &self.key)?;
        validate_required_field("fedex.password", &self.password)?;
        validate_required_field("fedex.account", &self.account)?;
        validate_required_field("fedex.meter", &self.meter)?;
        validate_optional_url("fedex.endpoint", &self.endpoint)?;
        validate_timeout("fedex.timeout_seconds", self.timeout_seconds)?;
        for notification in &self.notifications {
            validate_required_field("fedex.notifications.address", &notification.address)?;
        }
        Ok(())
    }
}

/// Endicia label-service credentials (certified intermediary).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndiciaConfig {
    /// Partner id sent as `RequesterID` outside test mode.
    pub requester_id: String,
    pub account_id: Option<String>,
    pub passphrase: Option<String>,
    /// Previously issued token; replaces account id and pass phrase when set.
    pub token: Option<String>,
    #[serde(default)]
    pub test: bool,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Validate for EndiciaConfig {
    fn validate(&self) -> Result<()> {
        validate_required_field("endicia.requester_id", &self.requester_id)?;
        let has_token = self.token.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_token {
            let account = self.account_id.as_deref().unwrap_or_default();
            let passphrase = self.passphrase.as_deref().unwrap_or_default();
            if account.trim().is_empty() || passphrase.trim().is_empty() {
                return Err(CarrierError::ConfigError {
                    message: "endicia requires either token or account_id and passphrase"
                        .to_string(),
                });
            }
        }
        validate_optional_url("endicia.endpoint", &self.endpoint)?;
        validate_timeout("endicia.timeout_seconds", self.timeout_seconds)
    }
}

/// REST postage API credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestPostageConfig {
    pub api_key: String,
    pub customer_id: String,
    #[serde(default)]
    pub test: bool,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Validate for RestPostageConfig {
    fn validate(&self) -> Result<()> {
        validate_required_field("rest_postage.api_key", &self.api_key)?;
        validate_required_field("rest_postage.customer_id", &self.customer_id)?;
        validate_optional_url("rest_postage.endpoint", &self.endpoint)?;
        validate_timeout("rest_postage.timeout_seconds", self.timeout_seconds)
    }
}
