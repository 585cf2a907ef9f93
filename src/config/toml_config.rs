use crate::config::carrier_config::{EndiciaConfig, FedExConfig, RestPostageConfig};
use crate::utils::error::{CarrierError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Credentials for every configured carrier, one optional table per carrier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierSettings {
    pub fedex: Option<FedExConfig>,
    pub endicia: Option<EndiciaConfig>,
    pub rest_postage: Option<RestPostageConfig>,
}

impl CarrierSettings {
    /// Loads settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let settings: Self =
            toml::from_str(&processed_content).map_err(|e| CarrierError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Replaces `${VAR}` references; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CarrierError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for CarrierSettings {
    fn validate(&self) -> Result<()> {
        if let Some(fedex) = &self.fedex {
            fedex.validate()?;
        }
        if let Some(endicia) = &self.endicia {
            endicia.validate()?;
        }
        if let Some(rest_postage) = &self.rest_postage {
            rest_postage.validate()?;
        }
        Ok(())
    }
}
