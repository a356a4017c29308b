// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ordered interceptor pipeline.
//!
//! ## Evaluation
//!
//! ```text
//! Pending ─▶ Evaluating(0) ─▶ Evaluating(1) ─▶ … ─▶ Allowed
//!                 │                 │
//!                 └──── Deny ───────┴──────────────▶ Rejected(status, reason)
//! ```
//!
//! For each request the chain walks the rules covering the path in
//! `(order, registration)` order and stops at the first denial. A fault or
//! panic inside an interceptor is a denial with status 500; the chain never
//! fails open.
//!
//! The rule list is sorted and validated once in [`ChainBuilder::build`] and
//! is immutable afterwards, so it can be shared across requests without
//! locking.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use thiserror::Error;

use super::interceptor::{Interceptor, RequestContext, Verdict};
use super::path::{PatternError, PatternSet};
use super::session::ResolvedSession;
use super::AuthError;

/// Rule-set problems detected at startup.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid path pattern for interceptor '{interceptor}': {source}")]
    Pattern {
        interceptor: &'static str,
        #[source]
        source: PatternError,
    },
    #[error("interceptor '{0}' has no include patterns")]
    NoIncludePatterns(&'static str),
    #[error("expected exactly one session-resolving interceptor, found {0}")]
    SessionInterceptorCount(usize),
    #[error("session interceptor '{session}' must run before '{other}'")]
    SessionInterceptorNotFirst {
        session: &'static str,
        other: &'static str,
    },
}

/// One interceptor with the paths it covers and its position in the chain.
pub struct InterceptorRule {
    interceptor: Arc<dyn Interceptor>,
    include: PatternSet,
    exclude: PatternSet,
    order: i32,
    registration: usize,
}

impl InterceptorRule {
    /// A rule for `interceptor` with no patterns and order `0`.
    pub fn new(interceptor: impl Interceptor + 'static) -> Self {
        Self::from_arc(Arc::new(interceptor))
    }

    pub fn from_arc(interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            interceptor,
            include: PatternSet::new(),
            exclude: PatternSet::new(),
            order: 0,
            registration: 0,
        }
    }

    /// Paths this rule applies to.
    pub fn include(mut self, patterns: PatternSet) -> Self {
        self.include = patterns;
        self
    }

    /// Paths this rule never applies to, even if included.
    pub fn exclude(mut self, patterns: PatternSet) -> Self {
        self.exclude = patterns;
        self
    }

    /// Compile and set the include patterns.
    pub fn include_paths<I, S>(self, patterns: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = self.interceptor.name();
        let set = PatternSet::parse(patterns).map_err(|source| ChainError::Pattern {
            interceptor: name,
            source,
        })?;
        Ok(self.include(set))
    }

    /// Compile and set the exclude patterns.
    pub fn exclude_paths<I, S>(self, patterns: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = self.interceptor.name();
        let set = PatternSet::parse(patterns).map_err(|source| ChainError::Pattern {
            interceptor: name,
            source,
        })?;
        Ok(self.exclude(set))
    }

    /// Lower runs first.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &'static str {
        self.interceptor.name()
    }

    pub fn order_value(&self) -> i32 {
        self.order
    }

    /// Included and not excluded. Exclusion wins.
    pub fn covers(&self, path: &str) -> bool {
        self.include.matches_any(path) && !self.exclude.matches_any(path)
    }

    fn sort_key(&self) -> (i32, usize) {
        (self.order, self.registration)
    }
}

impl std::fmt::Debug for InterceptorRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRule")
            .field("interceptor", &self.interceptor.name())
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("order", &self.order)
            .field("registration", &self.registration)
            .finish()
    }
}

/// Collects rules in registration order.
#[derive(Default)]
pub struct ChainBuilder {
    rules: Vec<InterceptorRule>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, mut rule: InterceptorRule) -> Self {
        rule.registration = self.rules.len();
        self.rules.push(rule);
        self
    }

    /// Sort the rules and check the rule-set invariants.
    pub fn build(mut self) -> Result<InterceptorChain, ChainError> {
        if let Some(rule) = self.rules.iter().find(|r| r.include.is_empty()) {
            return Err(ChainError::NoIncludePatterns(rule.name()));
        }

        self.rules.sort_by_key(InterceptorRule::sort_key);

        let session_rules = self
            .rules
            .iter()
            .filter(|r| r.interceptor.resolves_session())
            .count();
        if session_rules != 1 {
            return Err(ChainError::SessionInterceptorCount(session_rules));
        }
        if let Some(first) = self.rules.first() {
            if !first.interceptor.resolves_session() {
                let session = self
                    .rules
                    .iter()
                    .find(|r| r.interceptor.resolves_session())
                    .map(InterceptorRule::name)
                    .unwrap_or_default();
                return Err(ChainError::SessionInterceptorNotFirst {
                    session,
                    other: first.name(),
                });
            }
        }

        Ok(InterceptorChain {
            rules: self.rules.into(),
        })
    }
}

/// Terminal state of one evaluation.
#[derive(Debug)]
pub enum ChainOutcome {
    /// Every covering interceptor allowed the request.
    Allowed(Option<ResolvedSession>),
    /// An interceptor denied the request; nothing after it ran.
    Rejected(AuthError),
}

impl ChainOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ChainOutcome::Allowed(_))
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&AuthError> {
        match self {
            ChainOutcome::Rejected(err) => Some(err),
            ChainOutcome::Allowed(_) => None,
        }
    }
}

/// The immutable, sorted rule set.
#[derive(Debug, Clone)]
pub struct InterceptorChain {
    rules: Arc<[InterceptorRule]>,
}

impl InterceptorChain {
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// All rules in evaluation order.
    pub fn rules(&self) -> &[InterceptorRule] {
        &self.rules
    }

    /// Rules covering `path`, in evaluation order.
    pub fn covering<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a InterceptorRule> {
        self.rules.iter().filter(move |rule| rule.covers(path))
    }

    /// Run the covering interceptors for one request.
    pub async fn evaluate(&self, mut ctx: RequestContext) -> ChainOutcome {
        let path = ctx.path().to_string();

        for rule in self.covering(&path) {
            let name = rule.name();
            let verdict = match AssertUnwindSafe(rule.interceptor.pre_handle(&mut ctx))
                .catch_unwind()
                .await
            {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(fault)) => {
                    tracing::error!(interceptor = name, path = %path, error = %fault, "Interceptor failed");
                    Verdict::Deny(AuthError::InternalFailure)
                }
                Err(_) => {
                    tracing::error!(interceptor = name, path = %path, "Interceptor panicked");
                    Verdict::Deny(AuthError::InternalFailure)
                }
            };

            match verdict {
                Verdict::Allow => {
                    tracing::debug!(interceptor = name, path = %path, "Interceptor allowed request");
                }
                Verdict::Deny(err) => {
                    tracing::info!(
                        interceptor = name,
                        path = %path,
                        status = err.status_code().as_u16(),
                        error_code = err.error_code(),
                        "Request rejected"
                    );
                    return ChainOutcome::Rejected(err);
                }
            }
        }

        ChainOutcome::Allowed(ctx.into_session())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::interceptor::InterceptorFault;
    use crate::auth::PrincipalKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed verdict and counts invocations.
    struct Spy {
        name: &'static str,
        verdict: Verdict,
        session_gate: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Spy {
        fn new(name: &'static str, verdict: Verdict) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    verdict,
                    session_gate: false,
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn session_gate(mut self) -> Self {
            self.session_gate = true;
            self
        }
    }

    #[async_trait]
    impl Interceptor for Spy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn resolves_session(&self) -> bool {
            self.session_gate
        }

        async fn pre_handle(&self, _ctx: &mut RequestContext) -> Result<Verdict, InterceptorFault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict.clone())
        }
    }

    struct Faulty;

    #[async_trait]
    impl Interceptor for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }

        async fn pre_handle(&self, _ctx: &mut RequestContext) -> Result<Verdict, InterceptorFault> {
            Err(InterceptorFault::new("faulty", "backend exploded"))
        }
    }

    struct Panicky;

    #[async_trait]
    impl Interceptor for Panicky {
        fn name(&self) -> &'static str {
            "panicky"
        }

        async fn pre_handle(&self, _ctx: &mut RequestContext) -> Result<Verdict, InterceptorFault> {
            panic!("interceptor bug");
        }
    }

    fn rule(interceptor: impl Interceptor + 'static, include: &[&str]) -> InterceptorRule {
        InterceptorRule::new(interceptor)
            .include_paths(include.iter().copied())
            .unwrap()
    }

    fn ctx(path: &str) -> RequestContext {
        RequestContext::new(path, None)
    }

    #[tokio::test]
    async fn first_denial_short_circuits() {
        let (first, first_calls) =
            Spy::new("first", Verdict::Deny(AuthError::NoSession));
        let (second, second_calls) = Spy::new("second", Verdict::Allow);

        let chain = InterceptorChain::builder()
            .register(rule(first.session_gate(), &["/**"]).order(1))
            .register(rule(second, &["/**"]).order(2))
            .build()
            .unwrap();

        let outcome = chain.evaluate(ctx("/backend/x")).await;

        assert_eq!(outcome.rejection(), Some(&AuthError::NoSession));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_allow_reaches_allowed() {
        let (first, first_calls) = Spy::new("first", Verdict::Allow);
        let (second, second_calls) = Spy::new("second", Verdict::Allow);

        let chain = InterceptorChain::builder()
            .register(rule(first.session_gate(), &["/**"]).order(1))
            .register(rule(second, &["/**"]).order(2))
            .build()
            .unwrap();

        assert!(chain.evaluate(ctx("/a")).await.is_allowed());
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sorted_by_order_not_registration() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let (late, late_calls) =
            Spy::new("late", Verdict::Deny(AuthError::InvalidSession));
        let (early, early_calls) = Spy::new(
            "early",
            Verdict::Deny(AuthError::WrongPrincipalKind {
                required: PrincipalKind::Admin,
                actual: PrincipalKind::User,
            }),
        );

        let chain = InterceptorChain::builder()
            .register(rule(late, &["/**"]).order(5))
            .register(rule(gate.session_gate(), &["/**"]).order(0))
            .register(rule(early, &["/**"]).order(3))
            .build()
            .unwrap();

        let names: Vec<_> = chain.rules().iter().map(InterceptorRule::name).collect();
        assert_eq!(names, ["gate", "early", "late"]);

        let outcome = chain.evaluate(ctx("/x")).await;
        assert_eq!(outcome.rejection().map(AuthError::error_code), Some("wrong_principal_kind"));
        assert_eq!(early_calls.load(Ordering::SeqCst), 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn equal_orders_keep_registration_order() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let (a, _) = Spy::new("a", Verdict::Allow);
        let (b, _) = Spy::new("b", Verdict::Allow);

        let chain = InterceptorChain::builder()
            .register(rule(gate.session_gate(), &["/**"]).order(1))
            .register(rule(a, &["/**"]).order(2))
            .register(rule(b, &["/**"]).order(2))
            .build()
            .unwrap();

        let names: Vec<_> = chain.rules().iter().map(InterceptorRule::name).collect();
        assert_eq!(names, ["gate", "a", "b"]);
    }

    #[tokio::test]
    async fn uncovered_rules_are_skipped() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let (admin, admin_calls) = Spy::new("admin", Verdict::Deny(AuthError::NoSession));

        let chain = InterceptorChain::builder()
            .register(rule(gate.session_gate(), &["/**"]).order(1))
            .register(rule(admin, &["/backend/**"]).order(2))
            .build()
            .unwrap();

        assert!(chain.evaluate(ctx("/front/index")).await.is_allowed());
        assert_eq!(admin_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exclude_wins_over_include() {
        let (gate, gate_calls) = Spy::new("gate", Verdict::Deny(AuthError::NoSession));

        let chain = InterceptorChain::builder()
            .register(
                rule(gate.session_gate(), &["/**"])
                    .exclude_paths(["/user/login"])
                    .unwrap()
                    .order(1),
            )
            .build()
            .unwrap();

        let only = &chain.rules()[0];
        assert!(!only.covers("/user/login"));
        assert!(only.covers("/user/logout"));

        assert!(chain.evaluate(ctx("/user/login")).await.is_allowed());
        assert_eq!(gate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn interceptor_fault_fails_closed() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let chain = InterceptorChain::builder()
            .register(rule(gate.session_gate(), &["/**"]).order(1))
            .register(rule(Faulty, &["/**"]).order(2))
            .build()
            .unwrap();

        let outcome = chain.evaluate(ctx("/a")).await;
        assert_eq!(outcome.rejection(), Some(&AuthError::InternalFailure));
    }

    #[tokio::test]
    async fn interceptor_panic_fails_closed() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let (after, after_calls) = Spy::new("after", Verdict::Allow);
        let chain = InterceptorChain::builder()
            .register(rule(gate.session_gate(), &["/**"]).order(1))
            .register(rule(Panicky, &["/**"]).order(2))
            .register(rule(after, &["/**"]).order(3))
            .build()
            .unwrap();

        let outcome = chain.evaluate(ctx("/a")).await;
        assert_eq!(outcome.rejection(), Some(&AuthError::InternalFailure));
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn build_requires_exactly_one_session_interceptor() {
        let (a, _) = Spy::new("a", Verdict::Allow);
        let err = InterceptorChain::builder()
            .register(rule(a, &["/**"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ChainError::SessionInterceptorCount(0)));

        let (a, _) = Spy::new("a", Verdict::Allow);
        let (b, _) = Spy::new("b", Verdict::Allow);
        let err = InterceptorChain::builder()
            .register(rule(a.session_gate(), &["/**"]))
            .register(rule(b.session_gate(), &["/**"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ChainError::SessionInterceptorCount(2)));
    }

    #[test]
    fn build_requires_session_interceptor_first() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let (admin, _) = Spy::new("admin", Verdict::Allow);
        let err = InterceptorChain::builder()
            .register(rule(gate.session_gate(), &["/**"]).order(2))
            .register(rule(admin, &["/backend/**"]).order(1))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::SessionInterceptorNotFirst {
                session: "gate",
                other: "admin"
            }
        ));
    }

    #[test]
    fn build_rejects_rules_without_includes() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let err = InterceptorChain::builder()
            .register(InterceptorRule::new(gate.session_gate()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ChainError::NoIncludePatterns("gate")));
    }

    #[test]
    fn invalid_patterns_name_the_interceptor() {
        let (gate, _) = Spy::new("gate", Verdict::Allow);
        let err = InterceptorRule::new(gate)
            .include_paths(["backend/**"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid path pattern for interceptor 'gate': path pattern 'backend/**' must start with '/'"
        );
    }
}
