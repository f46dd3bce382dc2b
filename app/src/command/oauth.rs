//! OAuth sign-in, split into the steps a terminal user drives by hand:
//! configure once, open the printed URL, paste the redirect back.

use talktastic_session::{OAuthCallback, OAuthConfig};

use super::CommonComponents;

#[derive(Debug, Clone)]
pub enum OAuthInput {
    Configure(OAuthConfig),
    Begin,
    Callback { url: String },
}

#[derive(Debug, Clone, Copy)]
pub struct OAuthStrategy;

impl super::CommandStrategy for OAuthStrategy {
    type Input = OAuthInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let mut store = common.session_store();

        match input {
            OAuthInput::Configure(config) => {
                let saved = store.configure_oauth(config)?;
                println!("OAuth configured for client {}", saved.client_id);
                println!("  Redirect URI: {}", saved.redirect_uri);
                println!("  Scope: {}", saved.scope);
            }
            OAuthInput::Begin => {
                let request = store.begin_oauth_exchange()?;
                println!("Open this URL to sign in:\n");
                println!("  {}\n", request.authorize_url()?);
                println!("Then run 'talktastic oauth callback <redirected-url>'.");
            }
            OAuthInput::Callback { url } => {
                let callback = OAuthCallback::parse(&url)?;
                let session = store.complete_oauth_exchange(&callback)?;
                println!("Signed in as {}", session.profile().name);
            }
        }

        Ok(())
    }
}
