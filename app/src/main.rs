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

mod command;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, InfoStrategy, InitStrategy, LoginInput,
    LoginStrategy, LogoutStrategy, OAuthInput, OAuthStrategy, ProfileInput, ProfileStrategy,
    RegisterInput, RegisterStrategy, VersionStrategy, WebhookInput, WebhookStrategy,
};
use talktastic_core::Sex;
use talktastic_session::OAuthConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "talktastic")]
#[command(about = "Talktastic chat client for n8n agents", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show version
    Version,
    /// Show configuration and session state
    Info,
    /// Create a local account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in
    Login {
        /// Sign in as the demo user
        #[arg(long, conflicts_with_all = ["email", "password"])]
        demo: bool,
        #[arg(long, requires = "password")]
        email: Option<String>,
        #[arg(long, requires = "email")]
        password: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in profile, updating any fields given
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        picture: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        location: Option<String>,
        /// male, female, other or prefer_not_to_say
        #[arg(long)]
        sex: Option<Sex>,
    },
    /// Sign in through an OAuth provider
    Oauth {
        #[command(subcommand)]
        action: OAuthAction,
    },
    /// Show or change the agent webhook
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },
    /// Chat with the agent
    Chat {
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
}

#[derive(Subcommand)]
enum OAuthAction {
    /// Save the provider settings
    Configure {
        #[arg(long)]
        client_id: String,
        #[arg(long)]
        authorize_endpoint: String,
        #[arg(long, default_value = "")]
        redirect_uri: String,
        #[arg(long, default_value = "")]
        scope: String,
        #[arg(long, default_value = "")]
        token_endpoint: String,
        #[arg(long, default_value = "")]
        user_info_endpoint: String,
    },
    /// Print the provider URL to open
    Begin,
    /// Finish sign-in with the URL the provider redirected to
    Callback { url: String },
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Print the effective webhook URL
    Show,
    /// Save a webhook URL that overrides the config
    Set { url: String },
    /// Remove the saved override
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Register {
            name,
            email,
            password,
        } => {
            RegisterStrategy
                .execute(RegisterInput {
                    name,
                    email,
                    password,
                })
                .await
        }
        Commands::Login {
            demo,
            email,
            password,
        } => {
            let input = match (demo, email, password) {
                (true, _, _) => LoginInput::Demo,
                (false, Some(email), Some(password)) => LoginInput::Credentials { email, password },
                _ => anyhow::bail!("Use --demo, or both --email and --password"),
            };
            LoginStrategy.execute(input).await
        }
        Commands::Logout => LogoutStrategy.execute(()).await,
        Commands::Profile {
            name,
            email,
            picture,
            age,
            location,
            sex,
        } => {
            ProfileStrategy
                .execute(ProfileInput {
                    name,
                    email,
                    picture,
                    age,
                    location,
                    sex,
                })
                .await
        }
        Commands::Oauth { action } => {
            let input = match action {
                OAuthAction::Configure {
                    client_id,
                    authorize_endpoint,
                    redirect_uri,
                    scope,
                    token_endpoint,
                    user_info_endpoint,
                } => OAuthInput::Configure(OAuthConfig {
                    client_id,
                    redirect_uri,
                    authorize_endpoint,
                    token_endpoint,
                    user_info_endpoint,
                    scope,
                }),
                OAuthAction::Begin => OAuthInput::Begin,
                OAuthAction::Callback { url } => OAuthInput::Callback { url },
            };
            OAuthStrategy.execute(input).await
        }
        Commands::Webhook { action } => {
            let input = match action {
                WebhookAction::Show => WebhookInput::Show,
                WebhookAction::Set { url } => WebhookInput::Set { url },
                WebhookAction::Clear => WebhookInput::Clear,
            };
            WebhookStrategy.execute(input).await
        }
        Commands::Chat { message } => ChatStrategy.execute(ChatInput { message }).await,
    }
}
