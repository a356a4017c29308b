// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Store
//!
//! Read-only access to the shared `token → principal` store written by the
//! login endpoints.
//!
//! ## Backends
//!
//! - [`RedisSessionStore`] - the shared store used in production
//! - [`InMemorySessionStore`] - bounded LRU for development and tests
//!
//! Backends report failures through [`StoreError`]. [`SessionLookup`] wraps a
//! backend with the lookup timeout and the expiry check, and is what the
//! interceptors talk to.

pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::auth::Session;

pub use memory::InMemorySessionStore;
pub use redis_store::RedisSessionStore;

/// Failures talking to a session store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("session store connection failed: {0}")]
    Connection(String),
    #[error("malformed session record: {0}")]
    Malformed(String),
}

/// A backend holding login sessions keyed by token.
///
/// Implementations must be safe to call from many requests at once.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session for `token`, `Ok(None)` when the key is absent.
    async fn fetch(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Timeout-bounded, expiry-aware session lookups.
#[derive(Clone)]
pub struct SessionLookup {
    store: Arc<dyn SessionStore>,
    timeout: Duration,
}

impl SessionLookup {
    pub fn new(store: Arc<dyn SessionStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Look up a live session, keeping store failures distinct from absence.
    ///
    /// Sessions past their `expires_at` are reported as absent even if the
    /// backend still holds them.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let fetched = tokio::time::timeout(self.timeout, self.store.fetch(token))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        let now = Utc::now();
        Ok(fetched.filter(|session| !session.is_expired_at(now)))
    }

    /// Look up a live session; store failures read as "no session" and are
    /// logged.
    pub async fn get(&self, token: &str) -> Option<Session> {
        match self.resolve(token).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    backend = self.store.backend(),
                    error = %e,
                    "Session store unavailable, treating token as unknown"
                );
                None
            }
        }
    }

    /// Ping the backend within the lookup timeout.
    pub async fn ping(&self) -> Result<(), StoreError> {
        tokio::time::timeout(self.timeout, self.store.ping())
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Store doubles shared by unit tests across the crate.

    use super::*;

    /// A store that never answers in time.
    pub struct StalledStore;

    #[async_trait]
    impl SessionStore for StalledStore {
        async fn fetch(&self, _token: &str) -> Result<Option<Session>, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }

        async fn ping(&self) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "stalled"
        }
    }

    /// A store whose connection is down.
    pub struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn fetch(&self, _token: &str) -> Result<Option<Session>, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        fn backend(&self) -> &'static str {
            "broken"
        }
    }
}
