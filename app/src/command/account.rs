//! Sign-in, sign-out and profile commands.

use talktastic_core::{ProfilePatch, Sex};

use super::{CommonComponents, print_session};

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Adds an account to the local credential store.
#[derive(Debug, Clone, Copy)]
pub struct RegisterStrategy;

impl super::CommandStrategy for RegisterStrategy {
    type Input = RegisterInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let store = common.session_store();

        let profile = store.register(&input.name, &input.email, &input.password)?;
        println!("Registered {} <{}>", profile.name, profile.email);
        println!("Run 'talktastic login --email {}' to sign in.", profile.email);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum LoginInput {
    Demo,
    Credentials { email: String, password: String },
}

/// Starts a session, replacing any existing one.
#[derive(Debug, Clone, Copy)]
pub struct LoginStrategy;

impl super::CommandStrategy for LoginStrategy {
    type Input = LoginInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let mut store = common.session_store();

        let session = match input {
            LoginInput::Demo => store.login_demo()?,
            LoginInput::Credentials { email, password } => {
                store.login_with_credentials(&email, &password)?
            }
        };

        println!("Signed in as {}", session.profile().name);
        Ok(())
    }
}

/// Ends the current session.
#[derive(Debug, Clone, Copy)]
pub struct LogoutStrategy;

impl super::CommandStrategy for LogoutStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let mut store = common.session_store();

        let was_signed_in = store.is_authenticated();
        store.end_session()?;
        println!("{}", if was_signed_in { "Signed out." } else { "Not signed in." });
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub sex: Option<Sex>,
}

impl From<ProfileInput> for ProfilePatch {
    fn from(input: ProfileInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            picture: input.picture,
            age: input.age,
            location: input.location,
            sex: input.sex,
        }
    }
}

/// Shows the signed-in profile, applying any requested edits first.
#[derive(Debug, Clone, Copy)]
pub struct ProfileStrategy;

impl super::CommandStrategy for ProfileStrategy {
    type Input = ProfileInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = CommonComponents::init()?;
        let mut store = common.session_store();

        let patch = ProfilePatch::from(input);
        let session = if patch.is_empty() {
            store.current().cloned()
        } else {
            store.update_profile(patch)?
        };

        let Some(session) = session else {
            anyhow::bail!("Not signed in. Run 'talktastic login' first.");
        };

        println!("Profile:");
        print_session(&session);
        Ok(())
    }
}
