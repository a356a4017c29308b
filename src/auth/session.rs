// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session representation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::principal::PrincipalKind;

/// A login session as held in the shared session store.
///
/// Sessions are created by the login endpoints and destroyed by logout or
/// store expiry; the gate only ever looks them up. `principal_kind` never
/// changes for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Session {
    /// Opaque session token (the store key, without prefix)
    #[serde(skip)]
    pub token: String,

    /// Employee id or customer id, depending on `principal_kind`
    pub principal_id: i64,

    /// Which kind of principal logged in
    pub principal_kind: PrincipalKind,

    /// When the store will drop this session
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        token: impl Into<String>,
        principal_id: i64,
        principal_kind: PrincipalKind,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            principal_id,
            principal_kind,
            expires_at,
        }
    }

    /// Whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A session that passed the global session check for the current request.
///
/// Only the global session interceptor can construct one, so any interceptor
/// holding a `ResolvedSession` knows the session lookup already happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession(Session);

impl ResolvedSession {
    pub(in crate::auth) fn new(session: Session) -> Self {
        Self(session)
    }

    pub fn session(&self) -> &Session {
        &self.0
    }

    pub fn principal_kind(&self) -> PrincipalKind {
        self.0.principal_kind
    }

    pub fn into_session(self) -> Session {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Utc::now();
        let session = Session::new("tok", 1, PrincipalKind::User, now);
        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn token_is_not_serialized() {
        let session = Session::new("secret", 7, PrincipalKind::Admin, Utc::now());
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("token").is_none());
        assert_eq!(json["principal_id"], 7);
        assert_eq!(json["principal_kind"], "admin");
    }

    #[test]
    fn resolved_session_exposes_kind() {
        let resolved = ResolvedSession::new(Session::new(
            "tok",
            3,
            PrincipalKind::Admin,
            Utc::now(),
        ));
        assert_eq!(resolved.principal_kind(), PrincipalKind::Admin);
        assert_eq!(resolved.session().principal_id, 3);
    }
}
