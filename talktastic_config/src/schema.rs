use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use talktastic_core::Geolocation;
use tracing::info;

const CONFIG_DIR: &str = "talktastic";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebhookConfig {
    #[serde(default = "WebhookConfig::default_url")]
    pub url: String,
    #[serde(default = "WebhookConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl WebhookConfig {
    fn default_url() -> String {
        "https://n8n.example.com/webhook/chat".to_string()
    }

    const fn default_timeout_secs() -> u64 {
        30
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Persisted key-value state; `~/talktastic/state.json` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn state_file(&self) -> anyhow::Result<PathBuf> {
        match &self.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_dir()?.join("state.json")),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "ChatConfig::default_welcome_message")]
    pub welcome_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Geolocation>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: Self::default_welcome_message(),
            location: None,
        }
    }
}

impl ChatConfig {
    fn default_welcome_message() -> Option<String> {
        Some("Welcome to Talktastic Hub! How can I help you today?".to_string())
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load `~/talktastic/config.json`, or the defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!(
                "No config file at {}, using defaults. Run 'talktastic init' to create one.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::ensure_config_dir()?.join(CONFIG_FILE);
        Self::write_template(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Set webhook.url to your n8n webhook (or run 'talktastic webhook set <url>')");
        println!("   2. Sign in with 'talktastic login --demo' or register an account");
        println!("   3. Run 'talktastic chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - webhook.timeout_secs: Seconds to wait for the agent before giving up");
        println!("   - storage.state_file: Where the session and settings are kept");
        println!("   - chat.welcome_message: Greeting shown at the top of a conversation");
        println!("   - chat.location: Latitude/longitude sent with your first message");
        println!();
        Ok(config_path)
    }

    /// Write the default template to `path`, refusing to overwrite.
    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }

        let config_template = r#"{
  "webhook": {
    "url": "https://n8n.example.com/webhook/chat",
    "timeout_secs": 30
  },
  "storage": {},
  "chat": {
    "welcome_message": "Welcome to Talktastic Hub! How can I help you today?"
  }
}"#;

        std::fs::write(path, config_template)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.webhook.url, "https://n8n.example.com/webhook/chat");
        assert_eq!(config.webhook.timeout_secs, 30);
        assert!(config.chat.welcome_message.is_some());
        assert!(config.chat.location.is_none());
        assert!(config.storage.state_file.is_none());
    }

    #[test]
    fn test_template_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::write_template(&path).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.webhook.timeout_secs, 30);
        assert!(Config::write_template(&path).is_err());
    }

    #[test]
    fn test_location_and_null_welcome() {
        let raw = r#"{
            "webhook": {"url": "http://localhost:5678/webhook/x"},
            "storage": {"state_file": "/tmp/state.json"},
            "chat": {"welcome_message": null,
                     "location": {"latitude": 1.5, "longitude": 2.5, "accuracy": 10.0}}
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.webhook.url, "http://localhost:5678/webhook/x");
        assert_eq!(config.webhook.timeout_secs, 30);
        assert!(config.chat.welcome_message.is_none());
        assert_eq!(config.chat.location.map(|l| l.latitude), Some(1.5));
        assert_eq!(
            config.storage.state_file().unwrap(),
            PathBuf::from("/tmp/state.json")
        );
    }
}
