use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanBridgeError {
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Network error during {operation}: {cause}")]
    NetworkError { operation: String, cause: String },

    #[error("Process error during {operation}: {cause}")]
    ProcessError { operation: String, cause: String },

    #[error("Timed out after {seconds}s during {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("No free 192.168.x.0/24 subnet left")]
    SubnetExhausted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PanBridgeError>;

impl PanBridgeError {
    pub fn network(operation: impl Into<String>, cause: impl ToString) -> Self {
        PanBridgeError::NetworkError {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    pub fn process(operation: impl Into<String>, cause: impl ToString) -> Self {
        PanBridgeError::ProcessError {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn invalid_address(input: &str, reason: impl ToString) -> Self {
        PanBridgeError::InvalidAddress {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}
