// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Error raised outside the interceptor chain (unknown routes, handler faults).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Response envelope shared by every rejection the service produces.
///
/// `code` repeats the HTTP status.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope {
    pub code: u16,
    pub message: String,
    #[schema(value_type = Object)]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    pub fn rejection(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(Envelope::rejection(self.status, self.message));
        (self.status, body).into_response()
    }
}
