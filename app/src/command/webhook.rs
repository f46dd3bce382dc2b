use super::CommonComponents;

#[derive(Debug, Clone)]
pub enum WebhookInput {
    Show,
    Set { url: String },
    Clear,
}

/// Shows or changes the saved agent endpoint.
#[derive(Debug, Clone, Copy)]
pub struct WebhookStrategy;

impl super::CommandStrategy for WebhookStrategy {
    type Input = WebhookInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let settings = common.endpoint_settings();

        match input {
            WebhookInput::Show => {
                let source = if settings.webhook_url().is_some() {
                    "saved override"
                } else {
                    "config"
                };
                println!("{} ({source})", common.endpoint());
            }
            WebhookInput::Set { url } => {
                let url = settings.set_webhook_url(&url)?;
                println!("Webhook URL saved: {url}");
            }
            WebhookInput::Clear => {
                settings.clear_webhook_url()?;
                println!("Webhook override cleared, using {}", common.endpoint());
            }
        }

        Ok(())
    }
}
