use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Invalid {format} input: {message}")]
    InvalidFormat { format: String, message: String },
    #[error("Empty {format} input")]
    EmptyInput { format: String },
    #[error("Invalid compression tier: {0} (expected minimal, moderate or aggressive)")]
    InvalidTier(String),
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CompressError {
    pub fn invalid_format(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat { format: format.into(), message: message.into() }
    }

    pub fn empty_input(format: impl Into<String>) -> Self {
        Self::EmptyInput { format: format.into() }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
