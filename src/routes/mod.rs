// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP routes.
//!
//! Identity is asserted by whatever sits in front of this service and arrives
//! as the `X-User-Id` header. There are no cookies or sessions here, so
//! cross-origin requests never carry credentials; browsers only need to be
//! allowed to send that header.

pub mod api;
pub mod leaderboard;
pub mod stats;

use crate::middleware::identity::{require_user, USER_ID_HEADER};
use crate::AppState;
use axum::extract::State;
use axum::http::{header, request::Parts, HeaderName, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Origins accepted in addition to the configured frontend.
const DEV_ORIGINS: [&str; 2] = ["http://localhost", "http://127.0.0.1"];

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub build_id: String,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        storage: state.config.storage_backend.as_str().to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
    })
}

/// The configured frontend, or a local dev server on any port.
fn is_allowed_origin(origin: &str, frontend_url: &str) -> bool {
    if origin == frontend_url.trim_end_matches('/') {
        return true;
    }
    DEV_ORIGINS.iter().any(|dev| {
        origin
            .strip_prefix(dev)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
    })
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(origin, &frontend_url))
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Health, estimates, leaderboards and global stats are anonymous
    let anonymous = Router::new()
        .route("/health", get(health_check))
        .merge(api::public_routes())
        .merge(leaderboard::routes())
        .merge(stats::routes());

    let identified = api::routes().route_layer(middleware::from_fn(require_user));

    Router::new()
        .merge(anonymous)
        .merge(identified)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors_layer(state.config.frontend_url.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
