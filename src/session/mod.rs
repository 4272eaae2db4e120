pub mod store;

use std::sync::Arc;

use tracing::debug;

use crate::auth::role::Role;
pub use store::{FileStore, MemoryStore, TokenStore};

/// Names under which session values are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
    pub role: String,
    pub username: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access: "auth_access".into(),
            refresh: "auth_refresh".into(),
            role: "auth_role".into(),
            username: "username".into(),
        }
    }
}

/// Session context over an injected token store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    keys: StorageKeys,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::with_keys(store, StorageKeys::default())
    }

    pub fn with_keys(store: Arc<dyn TokenStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(&self.keys.access)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(&self.keys.refresh)
    }

    /// Cached role string as stored, without interpretation.
    pub fn role(&self) -> Option<String> {
        self.read(&self.keys.role)
    }

    pub fn username(&self) -> Option<String> {
        self.read(&self.keys.username)
    }

    /// Stores the access token, and the refresh token when one was issued.
    pub fn store_tokens(&self, access: &str, refresh: Option<&str>) {
        if !access.is_empty() {
            self.store.set(&self.keys.access, access);
        }
        if let Some(refresh) = refresh.filter(|r| !r.is_empty()) {
            self.store.set(&self.keys.refresh, refresh);
        }
        debug!(rotated_refresh = refresh.is_some(), "tokens stored");
    }

    pub fn set_username(&self, username: &str) {
        self.store.set(&self.keys.username, username);
    }

    pub fn set_role(&self, role: Role) {
        self.store.set(&self.keys.role, role.as_str());
    }

    pub fn clear_role(&self) {
        self.store.remove(&self.keys.role);
    }

    /// Removes every session key.
    pub fn clear(&self) {
        for key in [
            &self.keys.access,
            &self.keys.refresh,
            &self.keys.role,
            &self.keys.username,
        ] {
            self.store.remove(key);
        }
        debug!("session cleared");
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|v| !v.is_empty())
    }
}
