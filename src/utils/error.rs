use thiserror::Error;

/// Hard failures. Carrier-reported business failures are never surfaced
/// through this type; they come back as response objects with `success == false`.
#[derive(Error, Debug)]
pub enum CarrierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed XML response: {message}")]
    Xml { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Label payload is not valid base64: {0}")]
    LabelDecodeError(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{carrier} does not support {operation}")]
    NotImplemented {
        carrier: &'static str,
        operation: &'static str,
    },
}

impl CarrierError {
    pub fn xml(message: impl std::fmt::Display) -> Self {
        CarrierError::Xml {
            message: message.to_string(),
        }
    }

    /// Keeps the first 500 characters of the reply body.
    pub fn http_status(status: u16, body: &str) -> Self {
        CarrierError::HttpStatus {
            status,
            body: body.trim().chars().take(500).collect(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CarrierError::ValidationError {
            message: message.into(),
        }
    }

    /// Configuration mistakes cannot be fixed by sending the request again.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CarrierError::ConfigError { .. }
                | CarrierError::MissingConfigError { .. }
                | CarrierError::InvalidConfigValueError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CarrierError>;
