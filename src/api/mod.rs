// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{interceptor_middleware, PrincipalKind, Session},
    error::{ApiError, Envelope},
    state::AppState,
};

pub mod health;

/// Gate-only router: health probes and API docs.
pub fn router(state: AppState) -> Router {
    router_with(state, Router::new())
}

/// Mount `business` routes behind the interceptor chain.
///
/// The chain runs for every request, including paths no route matches.
pub fn router_with(state: AppState, business: Router) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state.clone());

    Router::new()
        .merge(health_routes)
        .merge(business)
        .merge(SwaggerUi::new("/swagger-ui").url("/v2/api-docs", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, interceptor_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn not_found() -> ApiError {
    ApiError::not_found("no handler for this route")
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, health::liveness, health::readiness),
    components(
        schemas(
            Envelope,
            Session,
            PrincipalKind,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and session store readiness")
    )
)]
struct ApiDoc;
