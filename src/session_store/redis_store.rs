// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Redis-backed session store.
//!
//! The login endpoints write one key per session:
//!
//! ```text
//! {prefix}{token}  →  {"principal_id": 42, "principal_kind": "admin"}   (with TTL)
//! ```
//!
//! Expiry is owned by Redis; the remaining TTL is read alongside the value
//! so the session carries an `expires_at`. A key without a TTL never expires.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::{aio::ConnectionManager, Client};
use serde::Deserialize;

use super::{SessionStore, StoreError};
use crate::auth::{PrincipalKind, Session};

/// PTTL reply for a key with no expiry.
const PTTL_NO_EXPIRY: i64 = -1;

/// Stored session value.
#[derive(Debug, Deserialize)]
struct SessionRecord {
    principal_id: i64,
    principal_kind: PrincipalKind,
}

/// Session store backed by a shared Redis instance.
///
/// Holds one auto-reconnecting multiplexed connection that every request
/// clones; dropping an in-flight lookup does not leak it.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisSessionStore {
    /// Connect to Redis at `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::open(url)
            .map_err(|e| StoreError::Connection(format!("invalid Redis URL: {e}")))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            connection,
            key_prefix: key_prefix.into(),
        })
    }

    fn key_for(&self, token: &str) -> String {
        session_key(&self.key_prefix, token)
    }
}

fn session_key(prefix: &str, token: &str) -> String {
    format!("{prefix}{token}")
}

/// Turn a stored value and its PTTL into a session.
fn decode_session(
    token: &str,
    raw: &str,
    pttl_ms: i64,
    now: DateTime<Utc>,
) -> Result<Option<Session>, StoreError> {
    let record: SessionRecord = serde_json::from_str(raw)
        .map_err(|e| StoreError::Malformed(format!("{e}")))?;

    let expires_at = match pttl_ms {
        PTTL_NO_EXPIRY => DateTime::<Utc>::MAX_UTC,
        // key expired between GET and PTTL
        ms if ms < 0 => return Ok(None),
        ms => now
            .checked_add_signed(Duration::milliseconds(ms))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    };

    Ok(Some(Session::new(
        token,
        record.principal_id,
        record.principal_kind,
        expires_at,
    )))
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn fetch(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let key = self.key_for(token);
        let mut connection = self.connection.clone();

        let (raw, pttl_ms): (Option<String>, i64) = redis::pipe()
            .cmd("GET")
            .arg(&key)
            .cmd("PTTL")
            .arg(&key)
            .query_async(&mut connection)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        match raw {
            Some(raw) => decode_session(token, &raw, pttl_ms, Utc::now()),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
