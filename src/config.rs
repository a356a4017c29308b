// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Pattern
//! lists are comma-separated.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `REDIS_URL` | Shared session store | unset (in-memory store) |
//! | `SESSION_KEY_PREFIX` | Prefix of session keys in the store | `login:token:` |
//! | `SESSION_STORE_TIMEOUT_MS` | Upper bound on one session lookup | `500` |
//! | `SESSION_HEADER` | Header carrying the session token | `authorization` |
//! | `SESSION_COOKIE` | Cookie carrying the session token | `token` |
//! | `PUBLIC_PATHS` | Routes that need no session | see [`DEFAULT_PUBLIC_PATHS`] |
//! | `ADMIN_PATHS` | Routes reserved for staff | `/backend/**,/employee/**` |
//! | `USER_PATHS` | Routes reserved for customers | `/front/**` |
//! | `GLOBAL_ORDER` | Order of the session check | `1` |
//! | `ADMIN_ORDER` | Order of the staff check | `2` |
//! | `USER_ORDER` | Order of the customer check | `2` |
//! | `SEED_SESSIONS` | Dev only: `token:id:kind,...` loaded into the in-memory store | unset |
//! | `SESSION_TTL_SECS` | Lifetime of seeded sessions | `1800` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::PrincipalKind;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const REDIS_URL_ENV: &str = "REDIS_URL";
pub const SESSION_KEY_PREFIX_ENV: &str = "SESSION_KEY_PREFIX";
pub const SESSION_STORE_TIMEOUT_ENV: &str = "SESSION_STORE_TIMEOUT_MS";
pub const SESSION_HEADER_ENV: &str = "SESSION_HEADER";
pub const SESSION_COOKIE_ENV: &str = "SESSION_COOKIE";
pub const PUBLIC_PATHS_ENV: &str = "PUBLIC_PATHS";
pub const ADMIN_PATHS_ENV: &str = "ADMIN_PATHS";
pub const USER_PATHS_ENV: &str = "USER_PATHS";
pub const GLOBAL_ORDER_ENV: &str = "GLOBAL_ORDER";
pub const ADMIN_ORDER_ENV: &str = "ADMIN_ORDER";
pub const USER_ORDER_ENV: &str = "USER_ORDER";
pub const SEED_SESSIONS_ENV: &str = "SEED_SESSIONS";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` directive when the variable is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Login, static entry pages, shared file transfer, API docs and health checks.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/employee/login",
    "/employee/logout",
    "/user/sendMsg",
    "/user/login",
    "/front/shop/status",
    "/backend/index.html",
    "/backend/page/login/**",
    "/front/index.html",
    "/common/**",
    "/front/page/login.html",
    "/doc.html",
    "/webjars/**",
    "/swagger-resources",
    "/swagger-ui/**",
    "/v2/api-docs",
    "/health",
    "/health/**",
];

pub const DEFAULT_ADMIN_PATHS: &[&str] = &["/backend/**", "/employee/**"];

pub const DEFAULT_USER_PATHS: &[&str] = &["/front/**"];

const DEFAULT_STORE_TIMEOUT_MS: u64 = 500;
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("LOG_FORMAT must be 'json' or 'pretty', got '{0}'")]
    InvalidLogFormat(String),
    #[error("invalid SEED_SESSIONS entry '{0}' (expected token:id:kind)")]
    InvalidSeed(String),
    #[error("invalid session header name '{0}'")]
    InvalidHeaderName(String),
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Route coverage, ordering and token location for the interceptor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub public_paths: Vec<String>,
    pub admin_paths: Vec<String>,
    pub user_paths: Vec<String>,
    pub global_order: i32,
    pub admin_order: i32,
    pub user_order: i32,
    pub session_header: String,
    pub session_cookie: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            public_paths: owned(DEFAULT_PUBLIC_PATHS),
            admin_paths: owned(DEFAULT_ADMIN_PATHS),
            user_paths: owned(DEFAULT_USER_PATHS),
            global_order: 1,
            admin_order: 2,
            user_order: 2,
            session_header: "authorization".to_string(),
            session_cookie: "token".to_string(),
        }
    }
}

/// A development session loaded into the in-memory store at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSession {
    pub token: String,
    pub principal_id: i64,
    pub principal_kind: PrincipalKind,
}

impl FromStr for SeedSession {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSeed(s.to_string());
        let mut parts = s.trim().splitn(3, ':');
        let (Some(token), Some(id), Some(kind)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        if token.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            token: token.to_string(),
            principal_id: id.parse().map_err(|_| invalid())?,
            principal_kind: kind.parse().map_err(|_| invalid())?,
        })
    }
}

/// Where sessions live and how long a lookup may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub redis_url: Option<String>,
    pub key_prefix: String,
    pub lookup_timeout: Duration,
    pub memory_capacity: usize,
    pub seed_sessions: Vec<SeedSession>,
    pub seed_ttl: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: "login:token:".to_string(),
            lookup_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            seed_sessions: Vec::new(),
            seed_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub auth: AuthSettings,
    pub store: StoreSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_format: LogFormat::default(),
            auth: AuthSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; unset or blank variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(host) = var(HOST_ENV) {
            settings.host = host;
        }
        if let Some(port) = var(PORT_ENV) {
            settings.port = parse_number(PORT_ENV, &port)?;
        }
        if let Some(format) = var(LOG_FORMAT_ENV) {
            settings.log_format = format.parse()?;
        }

        let auth = &mut settings.auth;
        if let Some(paths) = var(PUBLIC_PATHS_ENV) {
            auth.public_paths = split_list(&paths);
        }
        if let Some(paths) = var(ADMIN_PATHS_ENV) {
            auth.admin_paths = split_list(&paths);
        }
        if let Some(paths) = var(USER_PATHS_ENV) {
            auth.user_paths = split_list(&paths);
        }
        if let Some(order) = var(GLOBAL_ORDER_ENV) {
            auth.global_order = parse_number(GLOBAL_ORDER_ENV, &order)?;
        }
        if let Some(order) = var(ADMIN_ORDER_ENV) {
            auth.admin_order = parse_number(ADMIN_ORDER_ENV, &order)?;
        }
        if let Some(order) = var(USER_ORDER_ENV) {
            auth.user_order = parse_number(USER_ORDER_ENV, &order)?;
        }
        if let Some(header) = var(SESSION_HEADER_ENV) {
            auth.session_header = header.trim().to_string();
        }
        if let Some(cookie) = var(SESSION_COOKIE_ENV) {
            auth.session_cookie = cookie.trim().to_string();
        }

        let store = &mut settings.store;
        store.redis_url = var(REDIS_URL_ENV);
        if let Some(prefix) = lookup(SESSION_KEY_PREFIX_ENV) {
            store.key_prefix = prefix;
        }
        if let Some(ms) = var(SESSION_STORE_TIMEOUT_ENV) {
            store.lookup_timeout =
                Duration::from_millis(parse_number(SESSION_STORE_TIMEOUT_ENV, &ms)?);
        }
        if let Some(secs) = var(SESSION_TTL_ENV) {
            store.seed_ttl = Duration::from_secs(parse_number(SESSION_TTL_ENV, &secs)?);
        }
        if let Some(seeds) = var(SEED_SESSIONS_ENV) {
            store.seed_sessions = split_list(&seeds)
                .iter()
                .map(|entry| entry.parse::<SeedSession>())
                .collect::<Result<_, _>>()?;
        }

        Ok(settings)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidBindAddress(addr))
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_mirror_the_route_registry() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.auth.admin_paths, ["/backend/**", "/employee/**"]);
        assert_eq!(settings.auth.user_paths, ["/front/**"]);
        assert!(settings.auth.public_paths.contains(&"/front/shop/status".to_string()));
        assert_eq!(
            (settings.auth.global_order, settings.auth.admin_order, settings.auth.user_order),
            (1, 2, 2)
        );
        assert!(settings.store.redis_url.is_none());
        assert_eq!(settings.store.lookup_timeout, Duration::from_millis(500));
    }

    #[test]
    fn reads_overrides() {
        let settings = settings_from(&[
            (PORT_ENV, "9000"),
            (LOG_FORMAT_ENV, "JSON"),
            (PUBLIC_PATHS_ENV, " /a , /b/** ,"),
            (ADMIN_ORDER_ENV, "5"),
            (REDIS_URL_ENV, "redis://cache:6379"),
            (SESSION_STORE_TIMEOUT_ENV, "250"),
            (SESSION_HEADER_ENV, "token"),
        ])
        .unwrap();

        assert_eq!(settings.port, 9000);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.auth.public_paths, ["/a", "/b/**"]);
        assert_eq!(settings.auth.admin_order, 5);
        assert_eq!(settings.store.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(settings.store.lookup_timeout, Duration::from_millis(250));
        assert_eq!(settings.auth.session_header, "token");
    }

    #[test]
    fn blank_values_keep_defaults() {
        let settings = settings_from(&[(PORT_ENV, "  "), (REDIS_URL_ENV, "")]).unwrap();
        assert_eq!(settings.port, 8080);
        assert!(settings.store.redis_url.is_none());
    }

    #[test]
    fn empty_key_prefix_is_allowed() {
        let settings = settings_from(&[(SESSION_KEY_PREFIX_ENV, "")]).unwrap();
        assert_eq!(settings.store.key_prefix, "");
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = settings_from(&[(GLOBAL_ORDER_ENV, "first")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: GLOBAL_ORDER_ENV,
                value: "first".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_log_format() {
        let err = settings_from(&[(LOG_FORMAT_ENV, "xml")]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogFormat("xml".to_string()));
    }

    #[test]
    fn parses_seed_sessions() {
        let settings =
            settings_from(&[(SEED_SESSIONS_ENV, "a1:1:admin, u2:2:user")]).unwrap();
        assert_eq!(
            settings.store.seed_sessions,
            vec![
                SeedSession {
                    token: "a1".to_string(),
                    principal_id: 1,
                    principal_kind: PrincipalKind::Admin,
                },
                SeedSession {
                    token: "u2".to_string(),
                    principal_id: 2,
                    principal_kind: PrincipalKind::User,
                },
            ]
        );
    }

    #[test]
    fn rejects_malformed_seeds() {
        for bad in ["a1:1", "a1:x:admin", ":1:admin", "a1:1:auditor"] {
            let err = settings_from(&[(SEED_SESSIONS_ENV, bad)]).unwrap_err();
            assert_eq!(err, ConfigError::InvalidSeed(bad.to_string()));
        }
    }

    #[test]
    fn bind_addr_parses_host_and_port() {
        let settings = settings_from(&[(HOST_ENV, "127.0.0.1"), (PORT_ENV, "3000")]).unwrap();
        assert_eq!(settings.bind_addr().unwrap().to_string(), "127.0.0.1:3000");

        let settings = settings_from(&[(HOST_ENV, "not a host")]).unwrap();
        assert!(settings.bind_addr().is_err());
    }
}
