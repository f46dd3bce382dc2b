//! Keys of the persisted key-value state.

pub const SESSION_KEY: &str = "talktastic_user";
pub const USERS_KEY: &str = "talktastic_users";
pub const OAUTH_STATE_KEY: &str = "talktastic_oauth_state";
pub const OAUTH_CONFIG_KEY: &str = "talktastic_oauth_config";
pub const WEBHOOK_URL_KEY: &str = "talktastic_webhook_url";
