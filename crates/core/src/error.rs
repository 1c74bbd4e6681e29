use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// A malformed touchpoint or journey. Always a caller data defect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("journey has no touchpoints")]
    EmptyJourney,

    #[error("customer key is empty")]
    EmptyCustomerKey,

    #[error("touchpoint {index} has an empty campaign id")]
    EmptyCampaignId { index: usize },

    #[error("touchpoint {index} is earlier than the touchpoint before it")]
    NonMonotonicTimestamp { index: usize },

    #[error("touchpoint {index} is a second conversion")]
    MultipleConversions { index: usize },

    #[error("conversion at touchpoint {index} is not the last touchpoint")]
    ConversionNotLast { index: usize },

    #[error("journey is closed: a conversion has already been recorded")]
    AppendAfterConversion,

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("unknown interaction type: {0}")]
    UnknownInteractionType(String),

    #[error("touchpoint {index} carries a value but is not a conversion")]
    ValueOnNonConversion { index: usize },

    #[error("conversion at touchpoint {index} has invalid value {value}")]
    InvalidConversionValue { index: usize, value: f64 },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid journey: {0}")]
    InvalidJourney(String),

    #[error("Unknown attribution model: {0}")]
    UnknownModel(String),

    #[error("Invalid output from {model} model: {reason}")]
    InvalidModelOutput { model: String, reason: String },

    #[error("Conservation violated for {scope}: expected {expected}, got {actual}")]
    ConservationViolation {
        scope: String,
        expected: f64,
        actual: f64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}
