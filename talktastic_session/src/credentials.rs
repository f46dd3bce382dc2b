//! Credential list kept as one JSON array under a single key.

use talktastic_core::{CredentialStore, KeyValueStore, StorageError, StoredCredential};
use tracing::info;

use crate::keys::USERS_KEY;

pub struct KvCredentialStore<S> {
    store: S,
}

impl<S: KeyValueStore> KvCredentialStore<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    fn read_all(&self) -> Result<Vec<StoredCredential>, StorageError> {
        match self.store.get(USERS_KEY)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }
}

impl<S: KeyValueStore> CredentialStore for KvCredentialStore<S> {
    fn find_by_email(&self, email: &str) -> Result<Option<StoredCredential>, StorageError> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|credential| credential.email.eq_ignore_ascii_case(email)))
    }

    fn insert(&self, credential: StoredCredential) -> Result<bool, StorageError> {
        let mut all = self.read_all()?;
        if all
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&credential.email))
        {
            return Ok(false);
        }

        info!("Registering user {}", credential.email);
        all.push(credential);
        self.store.set(USERS_KEY, &serde_json::to_string(&all)?)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn credential(email: &str) -> StoredCredential {
        StoredCredential::new(
            format!("id-{email}"),
            "Ada".to_string(),
            email.to_string(),
            "secret",
        )
    }

    #[test]
    fn insert_then_find() {
        let store = KvCredentialStore::new(MemoryStore::new());
        assert!(store.insert(credential("ada@example.com")).unwrap());

        let found = store.find_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(found.id, "id-ada@example.com");
        assert!(store.find_by_email("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_refused() {
        let store = KvCredentialStore::new(MemoryStore::new());
        assert!(store.insert(credential("ada@example.com")).unwrap());
        assert!(!store.insert(credential("ADA@example.com")).unwrap());
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn verify_checks_password() {
        let store = KvCredentialStore::new(MemoryStore::new());
        store.insert(credential("ada@example.com")).unwrap();

        assert!(store.verify("ada@example.com", "secret").unwrap().is_some());
        assert!(store.verify("ada@example.com", "wrong").unwrap().is_none());
        assert!(store.verify("nobody@example.com", "secret").unwrap().is_none());
    }
}
