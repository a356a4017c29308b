// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration of the default interceptor chain.
//!
//! | Order | Interceptor | Covers | Skips |
//! |-------|-------------|--------|-------|
//! | 1 | global session | `/**` | public paths |
//! | 2 | admin | admin paths | public paths |
//! | 2 | user | user paths | public paths |
//!
//! Admin and user share an order on disjoint path sets; admin is
//! registered first, so it wins the tie if the sets ever overlap.

use std::sync::Arc;

use super::chain::{ChainError, InterceptorChain, InterceptorRule};
use super::interceptors::{AdminInterceptor, GlobalSessionInterceptor, UserInterceptor};
use crate::config::AuthSettings;
use crate::session_store::SessionLookup;

/// Build the gate's chain from settings.
pub fn default_chain(
    settings: &AuthSettings,
    sessions: Arc<SessionLookup>,
) -> Result<InterceptorChain, ChainError> {
    let public = &settings.public_paths;

    let global = InterceptorRule::new(GlobalSessionInterceptor::new(sessions))
        .include_paths(["/**"])?
        .exclude_paths(public)?
        .order(settings.global_order);

    let admin = InterceptorRule::new(AdminInterceptor::new())
        .include_paths(&settings.admin_paths)?
        .exclude_paths(public)?
        .order(settings.admin_order);

    let user = InterceptorRule::new(UserInterceptor::new())
        .include_paths(&settings.user_paths)?
        .exclude_paths(public)?
        .order(settings.user_order);

    let chain = InterceptorChain::builder()
        .register(global)
        .register(admin)
        .register(user)
        .build()?;

    for rule in chain.rules() {
        tracing::debug!(
            interceptor = rule.name(),
            order = rule.order_value(),
            "Registered interceptor"
        );
    }

    Ok(chain)
}
