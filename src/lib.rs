// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Takeout Gate - request authentication for the takeout API
//!
//! Every request passes an ordered chain of interceptors before reaching a
//! business handler: a global session check backed by the shared session
//! store, then a staff check on back-office routes or a customer check on
//! storefront routes.
//!
//! ## Modules
//!
//! - `api` - Router assembly, health probes and API docs (Axum)
//! - `auth` - Path patterns, interceptors, the chain and its middleware
//! - `session_store` - Redis and in-memory session stores
//! - `config` - Environment configuration
//! - `telemetry` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod session_store;
pub mod state;
pub mod telemetry;
