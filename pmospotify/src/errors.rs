use thiserror::Error;

/// Failure while acquiring the helper session. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("OAuth token request failed: {0}")]
    OAuth(String),
    #[error("CSRF token request failed: {0}")]
    Csrf(String),
    #[error("Spotify refused the session ({code}): {message}")]
    Rejected { code: String, message: String },
}
