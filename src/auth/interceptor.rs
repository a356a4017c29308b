// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The interceptor contract and the per-request context it reads.

use async_trait::async_trait;
use thiserror::Error;

use super::session::ResolvedSession;
use super::AuthError;

/// What the chain knows about one incoming request.
///
/// Built by the middleware, handed by `&mut` through the interceptors in
/// order, and dropped when the request ends. The only write an interceptor
/// can make is attaching a [`ResolvedSession`], which only the global
/// session interceptor can produce.
#[derive(Debug, Clone)]
pub struct RequestContext {
    path: String,
    session_token: Option<String>,
    session: Option<ResolvedSession>,
}

impl RequestContext {
    /// Blank or whitespace-only tokens are treated as absent.
    pub fn new(path: impl Into<String>, session_token: Option<String>) -> Self {
        let session_token = session_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            path: path.into(),
            session_token,
            session: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// The session resolved earlier in the chain, if any.
    pub fn session(&self) -> Option<&ResolvedSession> {
        self.session.as_ref()
    }

    pub(in crate::auth) fn attach_session(&mut self, session: ResolvedSession) {
        self.session = Some(session);
    }

    pub fn into_session(self) -> Option<ResolvedSession> {
        self.session
    }
}

/// Outcome of one interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(AuthError),
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// Unexpected fault inside an interceptor. The chain turns it into a 500.
#[derive(Debug, Error)]
#[error("{interceptor}: {message}")]
pub struct InterceptorFault {
    pub interceptor: &'static str,
    pub message: String,
}

impl InterceptorFault {
    pub fn new(interceptor: &'static str, message: impl Into<String>) -> Self {
        Self {
            interceptor,
            message: message.into(),
        }
    }
}

/// A pre-handle gate run by the [`InterceptorChain`](super::InterceptorChain).
///
/// Implementations must not touch shared mutable state; the session store
/// read is the only I/O allowed.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this interceptor resolves the request's session. The chain
    /// requires exactly one such interceptor, ordered first.
    fn resolves_session(&self) -> bool {
        false
    }

    async fn pre_handle(&self, ctx: &mut RequestContext) -> Result<Verdict, InterceptorFault>;
}
