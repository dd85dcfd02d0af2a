//! Pluggable credential persistence.
//!
//! The controller never persists tokens itself; it calls the injected
//! store after every successful mutation that produced a usable token.
//! Store implementations must contain their own failures: both hooks are
//! infallible at this boundary, and a load that yields nothing is a miss,
//! not an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Tokens recovered from external storage. Either side may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Load/persist hooks for the access and refresh tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch whatever tokens external storage has. Partial or empty results
    /// are fine; implementations swallow their own errors.
    async fn load(&self) -> StoredCredentials;

    /// Record the current token pair. Implementations swallow their own
    /// errors.
    async fn persist(&self, access_token: &str, refresh_token: &str);
}

/// In-memory store for tests and single-process setups.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<StoredCredentials>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an initial token pair.
    #[must_use]
    pub fn with_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(StoredCredentials {
                access_token: Some(access_token.into()),
                refresh_token: Some(refresh_token.into()),
            }),
        }
    }

    /// Snapshot of the currently stored tokens.
    pub async fn snapshot(&self) -> StoredCredentials {
        self.inner.lock().await.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> StoredCredentials {
        self.inner.lock().await.clone()
    }

    async fn persist(&self, access_token: &str, refresh_token: &str) {
        let mut guard = self.inner.lock().await;
        guard.access_token = Some(access_token.to_string());
        guard.refresh_token = Some(refresh_token.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let store = MemoryCredentialStore::new();
        let loaded = store.load().await;
        assert!(loaded.access_token.is_none());
        assert!(loaded.refresh_token.is_none());
    }

    #[tokio::test]
    async fn persist_then_load_round_trips() {
        let store = MemoryCredentialStore::new();
        store.persist("AT", "RT").await;

        let loaded = store.load().await;
        assert_eq!(loaded.access_token.as_deref(), Some("AT"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("RT"));
    }

    #[tokio::test]
    async fn seeded_store_exposes_initial_tokens() {
        let store = MemoryCredentialStore::with_tokens("AT", "RT");
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.access_token.as_deref(), Some("AT"));
        assert_eq!(snapshot.refresh_token.as_deref(), Some("RT"));
    }
}
