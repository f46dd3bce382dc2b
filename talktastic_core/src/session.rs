//! The signed-in user and the token that binds their conversation thread.

use serde::{Deserialize, Serialize};

use crate::util::new_session_token;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            "prefer_not_to_say" => Ok(Self::PreferNotToSay),
            other => Err(format!(
                "unknown sex '{other}', expected male, female, other or prefer_not_to_say"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

impl Profile {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            picture: None,
            age: None,
            location: None,
            sex: None,
        }
    }

    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// Overwrite every field the patch sets, leaving the rest untouched.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if patch.picture.is_some() {
            self.picture = patch.picture;
        }
        if patch.age.is_some() {
            self.age = patch.age;
        }
        if patch.location.is_some() {
            self.location = patch.location;
        }
        if patch.sex.is_some() {
            self.sex = patch.sex;
        }
    }
}

/// Partial profile update. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub sex: Option<Sex>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Identity of the signed-in user plus the conversation token sent to the
/// remote agent with every request.
///
/// The token is fixed at construction; profile edits go through
/// [`Session::update_profile`] and can never touch it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(flatten)]
    profile: Profile,
    #[serde(default)]
    session_id: String,
}

impl Session {
    /// Start a new session for `profile` with a fresh token.
    #[must_use]
    pub fn begin(profile: Profile) -> Self {
        Self {
            profile,
            session_id: new_session_token(),
        }
    }

    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn update_profile(&mut self, patch: ProfilePatch) {
        self.profile.apply(patch);
    }

    /// Give a session restored without a token one. Returns whether a token
    /// had to be generated.
    pub fn ensure_session_id(&mut self) -> bool {
        if self.session_id.trim().is_empty() {
            self.session_id = new_session_token();
            true
        } else {
            false
        }
    }
}
