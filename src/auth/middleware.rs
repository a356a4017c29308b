// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Interceptor chain middleware for Axum.
//!
//! Runs the [`InterceptorChain`](super::InterceptorChain) before any handler.
//! A rejection short-circuits with the JSON envelope; an allowed request
//! carries its [`Session`] in the request extensions for
//! [`CurrentSession`](super::CurrentSession) to pick up.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/backend/employee/page", get(list_employees))
//!     .with_state(state.clone())
//!     .layer(axum::middleware::from_fn_with_state(state, interceptor_middleware));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::chain::ChainOutcome;
use super::interceptor::RequestContext;
use super::session::{ResolvedSession, Session};
use crate::config::{AuthSettings, ConfigError};
use crate::state::AppState;

/// Auth scheme prefix, matched case-insensitively.
const BEARER_PREFIX: &str = "Bearer ";

/// Where the session token is read from.
///
/// The header wins over the cookie. A `Bearer ` prefix on the header value
/// is stripped, in any letter case.
#[derive(Debug, Clone)]
pub struct SessionTokenSource {
    header: HeaderName,
    cookie: String,
}

impl SessionTokenSource {
    pub fn new(header: &str, cookie: impl Into<String>) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(header.trim().as_bytes())
            .map_err(|_| ConfigError::InvalidHeaderName(header.to_string()))?;
        Ok(Self {
            header,
            cookie: cookie.into(),
        })
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigError> {
        Self::new(&settings.session_header, settings.session_cookie.clone())
    }

    /// Extract the token from request headers.
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        self.header_token(headers)
            .or_else(|| self.cookie_token(headers))
    }

    fn header_token(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(&self.header)?.to_str().ok()?.trim_start();
        let token = match value.get(..BEARER_PREFIX.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) => {
                &value[BEARER_PREFIX.len()..]
            }
            _ => value,
        }
        .trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn cookie_token(&self, headers: &HeaderMap) -> Option<String> {
        if self.cookie.is_empty() {
            return None;
        }
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie)
            .map(|(_, value)| value.trim().trim_matches('"').to_string())
            .filter(|token| !token.is_empty())
    }
}

/// Gate every request through the interceptor chain.
pub async fn interceptor_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = state.token_source.extract(request.headers());
    let ctx = RequestContext::new(request.uri().path(), token);

    match state.chain.evaluate(ctx).await {
        ChainOutcome::Allowed(resolved) => {
            if let Some(session) = resolved.map(ResolvedSession::into_session) {
                request.extensions_mut().insert::<Session>(session);
            }
            next.run(request).await
        }
        ChainOutcome::Rejected(err) => err.into_response(),
    }
}
