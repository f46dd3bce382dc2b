use talktastic_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User with this email already exists: {0}")]
    DuplicateRegistration(String),

    #[error("Invalid state parameter. The request may have been tampered with.")]
    StateMismatch,

    #[error("OAuth is not configured")]
    OAuthNotConfigured,

    #[error("Invalid OAuth endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(StorageError::Serialize(e))
    }
}
