//! The session store: who is signed in, and the token their conversation
//! is bound to.
//!
//! All mutating operations write through to the key-value store before
//! updating the in-memory copy, so a failed write leaves both unchanged.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use talktastic_core::util::new_nonce;
use talktastic_core::{
    CredentialStore, KeyValueStore, Profile, ProfilePatch, Session, StoredCredential,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::credentials::KvCredentialStore;
use crate::error::{AuthError, Result};
use crate::keys::{OAUTH_CONFIG_KEY, OAUTH_STATE_KEY, SESSION_KEY};
use crate::oauth::{
    AuthorizationRequest, IdentityResolver, OAuthCallback, OAuthConfig, StaticIdentityResolver,
};

fn demo_profile() -> Profile {
    Profile::new("12345", "Demo User", "user@example.com")
        .with_picture("https://ui-avatars.com/api/?name=Demo+User&background=0D8ABC&color=fff")
}

pub struct SessionStore<S = Arc<dyn KeyValueStore>> {
    store: S,
    credentials: Box<dyn CredentialStore>,
    identity: Box<dyn IdentityResolver>,
    current: Option<Session>,
    oauth_config: Option<OAuthConfig>,
}

impl<S> SessionStore<S>
where
    S: KeyValueStore + Clone + 'static,
{
    /// A store whose credential list lives in the same key-value store.
    pub fn new(store: S) -> Self {
        Self {
            credentials: Box::new(KvCredentialStore::new(store.clone())),
            store,
            identity: Box::new(StaticIdentityResolver),
            current: None,
            oauth_config: None,
        }
    }
}

impl<S: KeyValueStore> SessionStore<S> {
    #[must_use]
    pub fn with_credentials(mut self, credentials: impl CredentialStore + 'static) -> Self {
        self.credentials = Box::new(credentials);
        self
    }

    #[must_use]
    pub fn with_identity_resolver(mut self, identity: impl IdentityResolver + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Restore the persisted session and OAuth configuration.
    ///
    /// Unreadable state is logged and treated as absent.
    pub fn load(&mut self) -> Option<&Session> {
        self.oauth_config = self.read_json(OAUTH_CONFIG_KEY);

        let mut session = self.read_json::<Session>(SESSION_KEY);
        if let Some(session) = session.as_mut() {
            if session.ensure_session_id() {
                info!("Restored session had no session id, generated one");
                if let Err(e) = self.persist_session(session) {
                    warn!("Could not persist backfilled session id: {e}");
                }
            }
        }

        self.current = session;
        match &self.current {
            Some(session) => info!("Restored session for {}", session.profile().email),
            None => info!("No persisted session"),
        }
        self.current.as_ref()
    }

    #[must_use]
    pub const fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Sign `profile` in with a fresh session id.
    pub fn begin_session(&mut self, profile: Profile) -> Result<Session> {
        let session = Session::begin(profile);
        self.persist_session(&session)?;
        info!(
            "Session started for {} ({})",
            session.profile().email,
            session.session_id()
        );
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Merge `patch` into the active profile. `Ok(None)` if nobody is
    /// signed in.
    pub fn update_profile(&mut self, patch: ProfilePatch) -> Result<Option<Session>> {
        let Some(mut updated) = self.current.clone() else {
            return Ok(None);
        };

        updated.update_profile(patch);
        self.persist_session(&updated)?;
        info!("Profile updated for {}", updated.profile().email);
        self.current = Some(updated.clone());
        Ok(Some(updated))
    }

    /// Sign out. Safe to call when already signed out.
    pub fn end_session(&mut self) -> Result<()> {
        self.store.remove(SESSION_KEY)?;
        if self.current.take().is_some() {
            info!("Session ended");
        }
        Ok(())
    }

    /// Sign in as the built-in demo account.
    pub fn login_demo(&mut self) -> Result<Session> {
        self.begin_session(demo_profile())
    }

    /// Add an account to the credential store. Does not sign in.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<Profile> {
        let credential = StoredCredential::new(
            Uuid::now_v7().to_string(),
            name.trim().to_string(),
            email.trim().to_string(),
            password,
        );
        let profile = credential.to_profile();

        if !self.credentials.insert(credential)? {
            return Err(AuthError::DuplicateRegistration(profile.email));
        }
        Ok(profile)
    }

    pub fn login_with_credentials(&mut self, email: &str, password: &str) -> Result<Session> {
        let Some(credential) = self.credentials.verify(email.trim(), password)? else {
            warn!("Rejected sign-in for {}", email.trim());
            return Err(AuthError::InvalidCredentials);
        };
        self.begin_session(credential.to_profile())
    }

    #[must_use]
    pub const fn oauth_config(&self) -> Option<&OAuthConfig> {
        self.oauth_config.as_ref()
    }

    pub fn configure_oauth(&mut self, config: OAuthConfig) -> Result<OAuthConfig> {
        let config = config.with_defaults();
        self.store
            .set(OAUTH_CONFIG_KEY, &serde_json::to_string(&config)?)?;
        info!("OAuth configuration saved for client {}", config.client_id);
        self.oauth_config = Some(config.clone());
        Ok(config)
    }

    /// Generate and persist a nonce, and describe the redirect to the
    /// provider.
    pub fn begin_oauth_exchange(&self) -> Result<AuthorizationRequest> {
        let config = self
            .oauth_config
            .as_ref()
            .ok_or(AuthError::OAuthNotConfigured)?;

        let state = new_nonce();
        self.store.set(OAUTH_STATE_KEY, &state)?;

        Ok(AuthorizationRequest {
            authorize_endpoint: config.authorize_endpoint.clone(),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            state,
        })
    }

    /// The nonce of an exchange that has begun but not completed.
    #[must_use]
    pub fn pending_oauth_state(&self) -> Option<String> {
        self.store
            .get(OAUTH_STATE_KEY)
            .ok()
            .flatten()
            .filter(|state| !state.is_empty())
    }

    /// Accept the provider's callback if its state matches the pending
    /// nonce. The nonce is consumed before the identity is resolved, so a
    /// replayed callback always fails.
    pub fn complete_oauth_exchange(&mut self, callback: &OAuthCallback) -> Result<Session> {
        match self.pending_oauth_state() {
            Some(expected) if expected == callback.state => {}
            Some(_) => {
                warn!("OAuth callback state does not match the pending nonce");
                return Err(AuthError::StateMismatch);
            }
            None => {
                warn!("OAuth callback received with no exchange pending");
                return Err(AuthError::StateMismatch);
            }
        }

        self.store.remove(OAUTH_STATE_KEY)?;

        let config = self.oauth_config.clone().unwrap_or_default();
        let profile = self.identity.resolve(&callback.code, &config)?;
        self.begin_session(profile)
    }

    fn persist_session(&self, session: &Session) -> Result<()> {
        self.store
            .set(SESSION_KEY, &serde_json::to_string(session)?)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring unreadable {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read {key}: {e}");
                None
            }
        }
    }
}
