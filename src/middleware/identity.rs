// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Caller identity middleware.
//!
//! Authentication happens upstream (gateway or frontend server); the
//! resolved user id arrives in the `X-User-Id` header.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

const MAX_USER_ID_LEN: usize = 128;

/// Caller identity for protected routes.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Middleware that requires a caller identity.
pub async fn require_user(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| is_valid_user_id(id))
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Non-empty, bounded, and usable as a Firestore document id.
fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_USER_ID_LEN
        && !id.contains('/')
        && id != "."
        && id != ".."
}
