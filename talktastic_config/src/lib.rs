mod schema;

pub use schema::{ChatConfig, Config, StorageConfig, WebhookConfig};
