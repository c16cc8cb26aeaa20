//! Double-submit CSRF protection.
//!
//! Safe requests receive a random token cookie when they arrive without one.
//! Unsafe requests must echo that cookie in the CSRF header.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;

use crate::error::AppError;
use crate::AppState;

const COOKIE_MAX_AGE_DAYS: i64 = 365;

pub async fn csrf_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    req: Request<Body>,
    next: Next,
) -> Response {
    let cfg = &state.config.csrf;
    let cookie_token = jar
        .get(&cfg.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    if !is_safe(req.method()) {
        let header_token = req
            .headers()
            .get(cfg.header_name.as_str())
            .and_then(|v| v.to_str().ok());

        let valid = match (cookie_token.as_deref(), header_token) {
            (Some(cookie), Some(header)) => tokens_match(cookie, header),
            _ => false,
        };
        if !valid {
            tracing::warn!("Rejected {} {}: CSRF check failed", req.method(), req.uri().path());
            return AppError::Forbidden("CSRF token missing or incorrect".to_string())
                .into_response();
        }
        return next.run(req).await;
    }

    let res = next.run(req).await;
    if cookie_token.is_some() {
        return res;
    }

    let cookie = Cookie::build((cfg.cookie_name.clone(), generate_token()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(cfg.cookie_secure)
        .http_only(false)
        .max_age(time::Duration::days(COOKIE_MAX_AGE_DAYS))
        .build();
    (jar.add(cookie), res).into_response()
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

// Length leaks nothing useful; the comparison itself must not short-circuit.
fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
