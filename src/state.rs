// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{default_chain, InterceptorChain, SessionTokenSource};
use crate::config::AuthSettings;
use crate::session_store::SessionLookup;

/// Shared, read-only state built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<InterceptorChain>,
    pub sessions: Arc<SessionLookup>,
    pub token_source: Arc<SessionTokenSource>,
}

/// Startup failure while assembling the gate.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Chain(#[from] crate::auth::ChainError),
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl AppState {
    pub fn new(
        chain: InterceptorChain,
        sessions: Arc<SessionLookup>,
        token_source: SessionTokenSource,
    ) -> Self {
        Self {
            chain: Arc::new(chain),
            sessions,
            token_source: Arc::new(token_source),
        }
    }

    /// Build the default chain over `sessions`.
    pub fn from_settings(
        settings: &AuthSettings,
        sessions: Arc<SessionLookup>,
    ) -> Result<Self, StateError> {
        let chain = default_chain(settings, sessions.clone())?;
        let token_source = SessionTokenSource::from_settings(settings)?;
        Ok(Self::new(chain, sessions, token_source))
    }
}
