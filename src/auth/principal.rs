// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principal kinds recognised by the gate.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The two kinds of authenticated principal.
///
/// - `Admin` - Back-office staff (employees), owns `/backend/**` and `/employee/**`
/// - `User` - End customers, owns `/front/**`
///
/// There is no hierarchy: an admin session does not satisfy a customer route
/// and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// Administrative staff
    Admin,
    /// End customer
    User,
}

impl PrincipalKind {
    /// Reason given when a session of another kind hits a route reserved for `self`.
    pub fn denial_reason(&self) -> &'static str {
        match self {
            PrincipalKind::Admin => "not an administrator",
            PrincipalKind::User => "not a customer",
        }
    }
}

impl FromStr for PrincipalKind {
    type Err = String;

    /// Case-insensitive; `employee` and `customer` are accepted as aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "employee" => Ok(PrincipalKind::Admin),
            "user" | "customer" => Ok(PrincipalKind::User),
            other => Err(format!("unknown principal kind '{other}'")),
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalKind::Admin => write!(f, "admin"),
            PrincipalKind::User => write!(f, "user"),
        }
    }
}
