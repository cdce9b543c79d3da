use thiserror::Error;

/// Failure to complete an exchange with the target, as opposed to a
/// completed exchange that returned an unexpected status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    Connect { message: String },
    #[error("Request timed out.")]
    Timeout,
    #[error("Transfer failed: {message}")]
    Transfer { message: String },
    #[error("Failed to build HTTP client: {message}")]
    Build { message: String },
}

pub type TransportResult<T> = Result<T, TransportError>;

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect {
                message: err.to_string(),
            }
        } else if err.is_builder() {
            TransportError::Build {
                message: err.to_string(),
            }
        } else {
            TransportError::Transfer {
                message: err.to_string(),
            }
        }
    }
}
