use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to communicate with server: {0}")]
    Transport(String),
    #[error("Server returned non-JSON response (status {status})")]
    NonJson { status: u16 },
    #[error("invalid JSON from server: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unauthorized")]
    Unauthorized,
    /// The backend answered with a truthy `error` field.
    #[error("{0}")]
    Application(String),
}
