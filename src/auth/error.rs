// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::principal::PrincipalKind;
use crate::error::ApiError;

/// Why the interceptor chain rejected a request.
///
/// Every failure inside the chain ends up as one of these; nothing else
/// crosses the chain boundary. Store outages are reported to the client
/// exactly like an unknown token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No session token in the request
    NoSession,
    /// Token unknown to the store, or the session has expired
    InvalidSession,
    /// Session exists but belongs to the wrong kind of principal
    WrongPrincipalKind {
        required: PrincipalKind,
        actual: PrincipalKind,
    },
    /// Session store unreachable or timed out
    StoreUnavailable,
    /// An interceptor failed while evaluating the request
    InternalFailure,
}

impl AuthError {
    /// Stable identifier for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NoSession => "no_session",
            AuthError::InvalidSession => "invalid_session",
            AuthError::WrongPrincipalKind { .. } => "wrong_principal_kind",
            AuthError::StoreUnavailable => "store_unavailable",
            AuthError::InternalFailure => "internal_failure",
        }
    }

    /// HTTP status sent back to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NoSession | AuthError::InvalidSession | AuthError::StoreUnavailable => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::WrongPrincipalKind { .. } => StatusCode::FORBIDDEN,
            AuthError::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Reason sent back to the client.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NoSession => "no session",
            AuthError::InvalidSession | AuthError::StoreUnavailable => {
                "invalid or expired session"
            }
            AuthError::WrongPrincipalKind { required, .. } => required.denial_reason(),
            AuthError::InternalFailure => "interceptor failure",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::WrongPrincipalKind { required, actual } => {
                write!(f, "route requires a {required} session, got {actual}")
            }
            AuthError::StoreUnavailable => write!(f, "session store unavailable"),
            other => write!(f, "{}", other.reason()),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::new(self.status_code(), self.reason()).into_response()
    }
}
