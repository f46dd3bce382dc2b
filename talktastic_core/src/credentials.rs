//! Registered-user records for email/password sign-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Profile, Sex};
use crate::storage::StorageError;
use crate::util::password_digest;

/// A registered account. Only the password digest is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

impl StoredCredential {
    #[must_use]
    pub fn new(id: String, name: String, email: String, password: &str) -> Self {
        let password_digest = password_digest(&email, password);
        Self {
            id,
            name,
            email,
            password_digest,
            created_at: Utc::now(),
            age: None,
            location: None,
            sex: None,
        }
    }

    #[must_use]
    pub fn matches_password(&self, password: &str) -> bool {
        password_digest(&self.email, password) == self.password_digest
    }

    #[must_use]
    pub fn to_profile(&self) -> Profile {
        let mut profile = Profile::new(self.id.clone(), self.name.clone(), self.email.clone());
        profile.age = self.age;
        profile.location.clone_from(&self.location);
        profile.sex = self.sex;
        profile
    }
}

/// Lookup and registration of accounts, keyed by email.
pub trait CredentialStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<StoredCredential>, StorageError>;

    /// Add an account. Returns `false` without writing if the email is taken.
    fn insert(&self, credential: StoredCredential) -> Result<bool, StorageError>;

    /// The account for `email` if `password` matches it.
    fn verify(&self, email: &str, password: &str) -> Result<Option<StoredCredential>, StorageError> {
        Ok(self
            .find_by_email(email)?
            .filter(|credential| credential.matches_password(password)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_stored_in_clear() {
        let credential = StoredCredential::new(
            "u1".to_string(),
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "hunter2",
        );
        assert_ne!(credential.password_digest, "hunter2");
        assert!(credential.matches_password("hunter2"));
        assert!(!credential.matches_password("hunter3"));
    }

    #[test]
    fn profile_carries_optional_fields() {
        let mut credential = StoredCredential::new(
            "u1".to_string(),
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "pw",
        );
        credential.age = Some(36);
        credential.sex = Some(Sex::Female);

        let profile = credential.to_profile();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.age, Some(36));
        assert_eq!(profile.sex, Some(Sex::Female));
        assert!(profile.picture.is_none());
    }
}
