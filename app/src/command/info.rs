use talktastic_config::Config;

use super::{CommonComponents, print_session};

/// Prints the effective configuration and the persisted state.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let config = &common.config;

        println!("=== talktastic Configuration ===\n");

        let config_path = Config::config_path()?;
        println!("Config File: {}", config_path.display());
        if !config_path.exists() {
            println!("  (not created, using defaults)");
        }
        println!();

        println!("Webhook:");
        println!("  Configured: {}", config.webhook.url);
        match common.endpoint_settings().webhook_url() {
            Some(url) => println!("  Override: {url}"),
            None => println!("  Override: (not set)"),
        }
        println!("  Effective: {}", common.endpoint());
        println!("  Timeout: {}s", config.webhook.timeout_secs);
        println!();

        println!("Storage:");
        println!("  State File: {}", config.storage.state_file()?.display());
        println!();

        println!("Chat:");
        match &config.chat.welcome_message {
            Some(welcome) => println!("  Welcome: {}", truncate(welcome, 60)),
            None => println!("  Welcome: (none)"),
        }
        match config.chat.location {
            Some(location) => println!(
                "  Location: {}, {} (±{}m)",
                location.latitude, location.longitude, location.accuracy
            ),
            None => println!("  Location: (not shared)"),
        }
        println!();

        let store = common.session_store();
        println!("Session:");
        match store.current() {
            Some(session) => print_session(session),
            None => println!("  (signed out)"),
        }
        println!();

        println!("OAuth:");
        match store.oauth_config() {
            Some(oauth) => {
                println!("  Client Id: {}", oauth.client_id);
                println!("  Authorize Endpoint: {}", oauth.authorize_endpoint);
                println!("  Redirect URI: {}", oauth.redirect_uri);
                println!("  Scope: {}", oauth.scope);
                if store.pending_oauth_state().is_some() {
                    println!("  Exchange: pending");
                }
            }
            None => println!("  (not configured)"),
        }

        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}
