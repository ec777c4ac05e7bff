// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (caller identity, security headers).

pub mod identity;
pub mod security;

pub use identity::{require_user, AuthUser};
