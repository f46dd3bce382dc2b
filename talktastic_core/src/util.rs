//! Identifier generation and credential hashing.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Literal sent in place of a session token when nobody is signed in.
pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Time-ordered id for a conversation log entry.
#[must_use]
pub fn new_message_id() -> Uuid {
    Uuid::now_v7()
}

/// Random token binding a conversation thread to the remote agent.
#[must_use]
pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Single-use value guarding an OAuth callback.
#[must_use]
pub fn new_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Hex-encoded SHA-256 digest of `email:password`, email lowercased.
#[must_use]
pub fn password_digest(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.to_ascii_lowercase().as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
