//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, so dispatch
//! in `main` is monomorphized and needs no boxing.

use std::sync::Arc;
use talktastic_config::Config;
use talktastic_core::{KeyValueStore, Session};
use talktastic_session::{EndpointSettings, JsonFileStore, SessionStore};
use tracing::info;

mod account;
mod chat;
mod info;
mod init;
mod oauth;
mod version;
mod webhook;

pub use account::{
    LoginInput, LoginStrategy, LogoutStrategy, ProfileInput, ProfileStrategy, RegisterInput,
    RegisterStrategy,
};
pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use oauth::{OAuthInput, OAuthStrategy};
pub use version::VersionStrategy;
pub use webhook::{WebhookInput, WebhookStrategy};

/// Contract shared by every command strategy.
///
/// Each strategy names its own input type, so parameters are passed
/// without runtime casting.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Components most commands need: the config and the persisted state.
struct CommonComponents {
    config: Config,
    state: Arc<dyn KeyValueStore>,
}

impl CommonComponents {
    fn init() -> anyhow::Result<Self> {
        let config = Config::load()?;
        let state_file = config.storage.state_file()?;
        if let Some(parent) = state_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("State file: {}", state_file.display());

        let state: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(state_file)?);
        Ok(Self { config, state })
    }

    /// Session store with the persisted session already restored.
    fn session_store(&self) -> SessionStore {
        let mut store = SessionStore::new(Arc::clone(&self.state));
        store.load();
        store
    }

    fn endpoint_settings(&self) -> EndpointSettings<Arc<dyn KeyValueStore>> {
        EndpointSettings::new(Arc::clone(&self.state))
    }

    /// The saved override, otherwise the configured webhook.
    fn endpoint(&self) -> String {
        self.endpoint_settings()
            .resolve_endpoint(&self.config.webhook.url)
    }
}

fn print_session(session: &Session) {
    let profile = session.profile();
    println!("  Name: {}", profile.name);
    println!("  Email: {}", profile.email);
    println!("  Id: {}", profile.id);
    if let Some(age) = profile.age {
        println!("  Age: {age}");
    }
    if let Some(location) = &profile.location {
        println!("  Location: {location}");
    }
    if let Some(sex) = profile.sex {
        println!("  Sex: {sex:?}");
    }
    if let Some(picture) = &profile.picture {
        println!("  Picture: {picture}");
    }
    println!("  Session: {}", session.session_id());
}
