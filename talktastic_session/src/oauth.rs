//! OAuth authorization-code flow: request construction, callback parsing
//! and the identity lookup that turns a code into a profile.

use serde::{Deserialize, Serialize};
use talktastic_core::Profile;
use url::Url;

use crate::error::AuthError;

/// Path the provider redirects back to.
pub const CALLBACK_PATH: &str = "/oauth-callback";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(default = "OAuthConfig::default_redirect_uri")]
    pub redirect_uri: String,
    pub authorize_endpoint: String,
    #[serde(default)]
    pub token_endpoint: String,
    #[serde(default)]
    pub user_info_endpoint: String,
    #[serde(default = "OAuthConfig::default_scope")]
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: Self::default_redirect_uri(),
            authorize_endpoint: String::new(),
            token_endpoint: String::new(),
            user_info_endpoint: String::new(),
            scope: Self::default_scope(),
        }
    }
}

impl OAuthConfig {
    fn default_redirect_uri() -> String {
        format!("http://localhost:5173{CALLBACK_PATH}")
    }

    fn default_scope() -> String {
        "openid profile email".to_string()
    }

    /// Fill blank fields from the defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        if self.redirect_uri.trim().is_empty() {
            self.redirect_uri = Self::default_redirect_uri();
        }
        if self.scope.trim().is_empty() {
            self.scope = Self::default_scope();
        }
        self
    }
}

/// Parameters of the redirect to the provider's authorize endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub authorize_endpoint: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
}

impl AuthorizationRequest {
    pub fn authorize_url(&self) -> Result<Url, AuthError> {
        let mut url = Url::parse(&self.authorize_endpoint)
            .map_err(|e| AuthError::InvalidEndpoint(format!("{}: {e}", self.authorize_endpoint)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scope)
            .append_pair("state", &self.state);
        Ok(url)
    }
}

/// The `code` and `state` the provider hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCallback {
    pub code: String,
    pub state: String,
}

impl OAuthCallback {
    #[must_use]
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: state.into(),
        }
    }

    /// Extract `code` and `state` from the URL the provider redirected to.
    pub fn parse(callback_url: &str) -> Result<Self, AuthError> {
        let url = Url::parse(callback_url)
            .map_err(|e| AuthError::InvalidCallback(format!("{callback_url}: {e}")))?;

        if url.path().trim_end_matches('/') != CALLBACK_PATH {
            return Err(AuthError::InvalidCallback(format!(
                "expected path {CALLBACK_PATH}, got {}",
                url.path()
            )));
        }

        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        match (code, state) {
            (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => {
                Ok(Self { code, state })
            }
            _ => Err(AuthError::InvalidCallback(
                "callback is missing code or state".to_string(),
            )),
        }
    }
}

/// Turns an authorization code into the signed-in user's profile.
///
/// A production resolver exchanges the code at `token_endpoint` and reads
/// `user_info_endpoint`.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, code: &str, config: &OAuthConfig) -> Result<Profile, AuthError>;
}

/// Resolves every code to the same fixed account.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentityResolver;

impl IdentityResolver for StaticIdentityResolver {
    fn resolve(&self, _code: &str, _config: &OAuthConfig) -> Result<Profile, AuthError> {
        Ok(Profile::new("12345", "Authentik User", "oauth@example.com").with_picture(
            "https://ui-avatars.com/api/?name=Authentik+User&background=0D8ABC&color=fff",
        ))
    }
}
