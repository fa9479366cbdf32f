use thiserror::Error;

#[derive(Error, Debug)]
pub enum WisherError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Contact store is corrupt: {message}")]
    StoreCorrupt { message: String },

    #[error("Delivery failed: {message}")]
    DeliveryError { message: String },

    #[error("Invalid birthdate '{value}', expected MM-DD")]
    InvalidBirthdate { value: String },
}

impl WisherError {
    pub fn delivery(message: impl Into<String>) -> Self {
        WisherError::DeliveryError {
            message: message.into(),
        }
    }

    /// 給操作者的修復建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            WisherError::HttpError(_) => "Check network connectivity and the webhook endpoint",
            WisherError::IoError(_) => "Check that the file exists and is readable/writable",
            WisherError::SerializationError(_) | WisherError::StoreCorrupt { .. } => {
                "Fix the contacts file: it must be a JSON array of contact objects"
            }
            WisherError::ConfigError { .. }
            | WisherError::MissingConfigError { .. }
            | WisherError::InvalidConfigValueError { .. } => {
                "Review the TOML configuration file and command line arguments"
            }
            WisherError::DeliveryError { .. } => {
                "The contact stays eligible; run again later to retry"
            }
            WisherError::InvalidBirthdate { .. } => "Use the MM-DD format, e.g. 11-02",
        }
    }
}

pub type Result<T> = std::result::Result<T, WisherError>;
