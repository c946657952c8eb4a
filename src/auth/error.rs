use thiserror::Error;

use crate::error::KeywardError;

/// Normalized authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Refresh token rejected (status {status})")]
    RefreshRejected { status: u16 },
    #[error("Unexpected status {status}")]
    Api { status: u16 },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timed out after {0}ms")]
    Timeout(u64),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::InvalidResponse(error.to_string());
        }
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<KeywardError> for AuthError {
    fn from(error: KeywardError) -> Self {
        match error {
            KeywardError::Timeout(ms) => Self::Timeout(ms),
            KeywardError::Network(err) => Self::from(err),
            KeywardError::Transport(msg) => Self::Network(msg),
            KeywardError::Api { status, .. } => Self::Api { status },
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

impl From<AuthError> for KeywardError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Timeout(ms) => KeywardError::Timeout(ms),
            AuthError::Network(msg) => KeywardError::Transport(msg),
            AuthError::Api { status } => KeywardError::api(status, "unexpected status"),
            other => KeywardError::Authentication(other.to_string()),
        }
    }
}
