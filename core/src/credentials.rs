/// Credential storage seam and Basic authorization encoding
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub const DEFAULT_SERVICE: &str = "com.SixEye.strings";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("{0}")]
    Storage(String),
}

/// `base64(username:password)`, the value sent after `Basic `.
pub fn basic_authorization(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

/// Secret storage keyed by service name, e.g. the OS keychain.
///
/// The stored secret is the already encoded Basic authorization value.
pub trait CredentialStore: Send + Sync {
    fn service(&self) -> &str;

    fn credentials(&self) -> Option<String>;

    fn store(&self, username: &str, password: &str) -> Result<(), CredentialError>;

    fn delete(&self);
}

impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    fn service(&self) -> &str {
        (**self).service()
    }

    fn credentials(&self) -> Option<String> {
        (**self).credentials()
    }

    fn store(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        (**self).store(username, password)
    }

    fn delete(&self) {
        (**self).delete()
    }
}

#[derive(Debug)]
pub struct MemoryCredentialStore {
    service: String,
    secret: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            secret: Mutex::new(None),
        }
    }

    /// Store that starts out holding `username:password`.
    pub fn preloaded(username: &str, password: &str) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.secret.lock() {
            *guard = Some(basic_authorization(username, password));
        }
        store
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn service(&self) -> &str {
        &self.service
    }

    fn credentials(&self) -> Option<String> {
        self.secret.lock().ok().and_then(|guard| guard.clone())
    }

    fn store(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        if username.trim().is_empty() {
            return Err(CredentialError::EmptyUsername);
        }
        let mut guard = self
            .secret
            .lock()
            .map_err(|_| CredentialError::Storage("credential lock poisoned".into()))?;
        *guard = Some(basic_authorization(username, password));
        Ok(())
    }

    fn delete(&self) {
        if let Ok(mut guard) = self.secret.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_basic_authorization() {
        assert_eq!(basic_authorization("user", "pass"), "dXNlcjpwYXNz");
        assert_eq!(basic_authorization("", ""), "Og==");
    }

    #[test]
    fn store_and_delete() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.service(), DEFAULT_SERVICE);
        assert!(store.credentials().is_none());

        store.store("user", "pass").unwrap();
        assert_eq!(store.credentials().as_deref(), Some("dXNlcjpwYXNz"));

        store.delete();
        assert!(store.credentials().is_none());
    }

    #[test]
    fn rejects_empty_usernames() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.store("  ", "pass"), Err(CredentialError::EmptyUsername));
        assert!(store.credentials().is_none());
    }

    #[test]
    fn shared_store_sees_the_same_secret() {
        let store = Arc::new(MemoryCredentialStore::preloaded("a", "b"));
        let handle = Arc::clone(&store);
        handle.delete();
        assert!(store.credentials().is_none());
    }
}
