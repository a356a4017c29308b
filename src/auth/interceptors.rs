// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The three gates of the default chain.
//!
//! 1. [`GlobalSessionInterceptor`] - some valid session must exist
//! 2. [`AdminInterceptor`] - back-office routes need an admin session
//! 3. [`UserInterceptor`] - customer routes need a customer session

use std::sync::Arc;

use async_trait::async_trait;

use super::interceptor::{Interceptor, InterceptorFault, RequestContext, Verdict};
use super::principal::PrincipalKind;
use super::session::ResolvedSession;
use super::AuthError;
use crate::session_store::SessionLookup;

/// Checks the request carries a token for a live session and attaches it.
pub struct GlobalSessionInterceptor {
    sessions: Arc<SessionLookup>,
}

impl GlobalSessionInterceptor {
    pub fn new(sessions: Arc<SessionLookup>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl Interceptor for GlobalSessionInterceptor {
    fn name(&self) -> &'static str {
        "global_session"
    }

    fn resolves_session(&self) -> bool {
        true
    }

    async fn pre_handle(&self, ctx: &mut RequestContext) -> Result<Verdict, InterceptorFault> {
        let Some(token) = ctx.session_token() else {
            return Ok(Verdict::Deny(AuthError::NoSession));
        };

        match self.sessions.resolve(token).await {
            Ok(Some(session)) => {
                tracing::debug!(
                    principal_id = session.principal_id,
                    principal_kind = %session.principal_kind,
                    "Session resolved"
                );
                ctx.attach_session(ResolvedSession::new(session));
                Ok(Verdict::Allow)
            }
            Ok(None) => Ok(Verdict::Deny(AuthError::InvalidSession)),
            Err(e) => {
                tracing::warn!(
                    backend = self.sessions.backend(),
                    error = %e,
                    "Session store unavailable, failing closed"
                );
                Ok(Verdict::Deny(AuthError::StoreUnavailable))
            }
        }
    }
}

/// Requires the resolved session to be of one principal kind.
///
/// Relies on the global session interceptor having run first. A request that
/// reaches this gate without a resolved session is denied as sessionless.
#[derive(Debug, Clone, Copy)]
struct KindGate {
    required: PrincipalKind,
}

impl KindGate {
    fn check(&self, ctx: &RequestContext) -> Verdict {
        match ctx.session().map(ResolvedSession::principal_kind) {
            Some(actual) if actual == self.required => Verdict::Allow,
            Some(actual) => Verdict::Deny(AuthError::WrongPrincipalKind {
                required: self.required,
                actual,
            }),
            None => Verdict::Deny(AuthError::NoSession),
        }
    }
}

/// Admits only administrator sessions.
pub struct AdminInterceptor {
    gate: KindGate,
}

impl AdminInterceptor {
    pub fn new() -> Self {
        Self {
            gate: KindGate {
                required: PrincipalKind::Admin,
            },
        }
    }
}

impl Default for AdminInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for AdminInterceptor {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn pre_handle(&self, ctx: &mut RequestContext) -> Result<Verdict, InterceptorFault> {
        Ok(self.gate.check(ctx))
    }
}

/// Admits only customer sessions.
pub struct UserInterceptor {
    gate: KindGate,
}

impl UserInterceptor {
    pub fn new() -> Self {
        Self {
            gate: KindGate {
                required: PrincipalKind::User,
            },
        }
    }
}

impl Default for UserInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for UserInterceptor {
    fn name(&self) -> &'static str {
        "user"
    }

    async fn pre_handle(&self, ctx: &mut RequestContext) -> Result<Verdict, InterceptorFault> {
        Ok(self.gate.check(ctx))
    }
}
