#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Session persistence, sign-in flows and the OAuth state contract.

mod credentials;
mod error;
pub mod keys;
mod oauth;
mod settings;
mod storage;
mod store;

pub use credentials::KvCredentialStore;
pub use error::{AuthError, Result};
pub use oauth::{
    AuthorizationRequest, CALLBACK_PATH, IdentityResolver, OAuthCallback, OAuthConfig,
    StaticIdentityResolver,
};
pub use settings::{EndpointSettings, SettingsError};
pub use storage::{JsonFileStore, MemoryStore};
pub use store::SessionStore;
