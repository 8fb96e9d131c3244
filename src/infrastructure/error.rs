use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// Transport or protocol failure; retry-eligible from the screen's
    /// point of view.
    #[error("API error: {0}")]
    Api(String),
    /// The server answered but refused the operation (`success: false`).
    /// Carries the server's own message when one was provided.
    #[error("{0}")]
    ServerRejected(String),
}
