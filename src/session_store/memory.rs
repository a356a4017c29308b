// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU session store.
//!
//! Stands in for the shared store in development and tests. Expired entries
//! are dropped when they are looked up.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;

use super::{SessionStore, StoreError};
use crate::auth::Session;
use crate::config::SeedSession;

/// Bounded in-memory session store.
pub struct InMemorySessionStore {
    sessions: Mutex<LruCache<String, Session>>,
}

impl InMemorySessionStore {
    /// Create a store holding at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Store a session under its token, evicting the least recently used
    /// entry when full.
    pub fn insert(&self, session: Session) {
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.put(session.token.clone(), session);
            }
            Err(_) => tracing::warn!(
                principal_id = session.principal_id,
                "In-memory session store lock poisoned, session not stored"
            ),
        }
    }

    /// Load development sessions that expire `ttl` from now.
    pub fn seed(&self, seeds: &[SeedSession], ttl: std::time::Duration) {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        for seed in seeds {
            self.insert(Session::new(
                seed.token.clone(),
                seed.principal_id,
                seed.principal_kind,
                expires_at,
            ));
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn fetch(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Connection("in-memory store lock poisoned".to_string()))?;

        match sessions.get(token) {
            Some(session) if !session.is_expired_at(Utc::now()) => {
                return Ok(Some(session.clone()))
            }
            Some(_) => {}
            None => return Ok(None),
        }
        sessions.pop(token);
        Ok(None)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PrincipalKind;
    use chrono::Duration;

    fn session(token: &str, ttl_secs: i64) -> Session {
        Session::new(
            token,
            1,
            PrincipalKind::Admin,
            Utc::now() + Duration::seconds(ttl_secs),
        )
    }

    #[tokio::test]
    async fn insert_and_fetch() {
        let store = InMemorySessionStore::new(8);
        assert!(store.fetch("tok").await.unwrap().is_none());

        store.insert(session("tok", 60));

        let found = store.fetch("tok").await.unwrap().unwrap();
        assert_eq!(found.token, "tok");
        assert_eq!(found.principal_kind, PrincipalKind::Admin);
    }

    #[tokio::test]
    async fn expired_entries_are_evicted_on_lookup() {
        let store = InMemorySessionStore::new(8);
        store.insert(session("stale", -1));
        assert_eq!(store.len(), 1);

        assert!(store.fetch("stale").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn poisoned_lock_drops_writes_and_fails_reads() {
        let store = std::sync::Arc::new(InMemorySessionStore::new(8));
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.sessions.lock().unwrap();
            panic!("writer died while holding the lock");
        })
        .join();

        store.insert(session("tok", 60));

        assert_eq!(store.len(), 0);
        assert!(matches!(
            store.fetch("tok").await,
            Err(StoreError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = InMemorySessionStore::new(2);
        store.insert(session("a", 60));
        store.insert(session("b", 60));
        // touch "a" so "b" becomes the eviction candidate
        assert!(store.fetch("a").await.unwrap().is_some());
        store.insert(session("c", 60));

        assert!(store.fetch("a").await.unwrap().is_some());
        assert!(store.fetch("b").await.unwrap().is_none());
        assert!(store.fetch("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn seeds_development_sessions() {
        let store = InMemorySessionStore::new(8);
        store.seed(
            &[SeedSession {
                token: "dev-admin".to_string(),
                principal_id: 1,
                principal_kind: PrincipalKind::Admin,
            }],
            std::time::Duration::from_secs(60),
        );

        let session = store.fetch("dev-admin").await.unwrap().unwrap();
        assert_eq!(session.principal_kind, PrincipalKind::Admin);
        assert!(session.expires_at > Utc::now());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let store = InMemorySessionStore::new(0);
        store.insert(session("only", 60));
        assert_eq!(store.len(), 1);
    }
}
