// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! The interceptor chain that guards the takeout API.
//!
//! ## Request Flow
//!
//! 1. The login endpoints (outside this crate) store `token → principal`
//!    in the shared session store
//! 2. Clients send the token in the configured header (or cookie)
//! 3. The middleware builds a [`RequestContext`] and runs the chain:
//!    - global session check: a live session must exist
//!    - admin check on back-office routes
//!    - user check on customer routes
//! 4. The first denial answers `{code, message, data: null}` with 401, 403
//!    or 500; otherwise the session is attached for handlers
//!
//! ## Security
//!
//! - Public routes are declared only through exclude patterns
//! - Store outages, timeouts and interceptor faults all deny
//! - Session lookups are bounded by a timeout

pub mod chain;
pub mod error;
pub mod extractor;
pub mod interceptor;
pub mod interceptors;
pub mod middleware;
pub mod path;
pub mod principal;
pub mod registry;
pub mod session;

pub use chain::{ChainBuilder, ChainError, ChainOutcome, InterceptorChain, InterceptorRule};
pub use error::AuthError;
pub use extractor::CurrentSession;
pub use interceptor::{Interceptor, InterceptorFault, RequestContext, Verdict};
pub use interceptors::{AdminInterceptor, GlobalSessionInterceptor, UserInterceptor};
pub use middleware::{interceptor_middleware, SessionTokenSource};
pub use path::{PathPattern, PatternError, PatternSet};
pub use principal::PrincipalKind;
pub use registry::default_chain;
pub use session::{ResolvedSession, Session};
