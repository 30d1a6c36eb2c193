//! Request middleware: bearer-token authentication, per-IP rate limiting,
//! security headers, body size cap.
//!
//! Authentication is resolve-and-inject: a presented token is hashed and
//! looked up in the session store, and the resulting identity is placed in
//! request extensions for the `AuthUser` extractor. A request without a
//! token passes through untouched, so public endpoints need no allowlist;
//! handlers that extract `AuthUser` reject it with 401. A token that fails
//! to resolve is rejected here regardless of path.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::auth::{token_digest, AuthUser};
use crate::config::sanitize_for_logging;
use crate::error::PalmaresError;
use crate::store::SharedStore;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub store: SharedStore,
}

/// Resolves `Authorization: Bearer <token>` into an [`AuthUser`] extension.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, PalmaresError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    let Some(token) = token else {
        return Ok(next.run(request).await);
    };

    let user_id = match state.store.resolve_session(&token_digest(&token)).await? {
        Some(user_id) => user_id,
        None => {
            warn!(
                token = %sanitize_for_logging(&token),
                path = request.uri().path(),
                "unknown bearer token"
            );
            return Err(PalmaresError::Authentication("unknown bearer token".to_string()));
        }
    };
    let user = state.store.get_user(user_id).await?.ok_or_else(|| {
        PalmaresError::Authentication("session user no longer exists".to_string())
    })?;

    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });
    Ok(next.run(request).await)
}

/// Outcome of a rate limit check for one request.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after_secs: u64,
}

/// Fixed-window counter per client IP.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            windows: DashMap::new(),
            limit: requests_per_minute,
            window: Duration::from_secs(60),
        }
    }

    pub fn check(&self, ip: &str) -> RateDecision {
        let now = Instant::now();
        let mut entry = self.windows.entry(ip.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) >= self.window {
            *count = 0;
            *window_start = now;
        }

        let reset_after_secs = self
            .window
            .checked_sub(now.duration_since(*window_start))
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if *count >= self.limit {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_after_secs,
            };
        }

        *count += 1;
        RateDecision {
            allowed: true,
            remaining: self.limit - *count,
            reset_after_secs,
        }
    }

    /// Drops windows that expired more than one period ago.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, (_, window_start)| now.duration_since(*window_start) < self.window * 2);
    }
}

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub limit_per_minute: u32,
}

impl RateLimitState {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(limit_per_minute)),
            limit_per_minute,
        }
    }
}

/// Client IP, preferring reverse-proxy headers over the socket address.
fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip) = value.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            return ip.trim().to_string();
        }
    }
    addr.ip().to_string()
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip(request.headers(), &addr);
    let decision = state.limiter.check(&ip);

    if !decision.allowed {
        warn!(client_ip = %ip, path = request.uri().path(), "rate limit exceeded");
        let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
        let headers = response.headers_mut();
        headers.insert("X-RateLimit-Limit", HeaderValue::from(state.limit_per_minute));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
        headers.insert("Retry-After", HeaderValue::from(decision.reset_after_secs));
        return Err(response);
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(state.limit_per_minute));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
    Ok(response)
}

/// Hardening headers for a JSON-only API.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    headers.remove("Server");

    response
}

#[derive(Clone)]
pub struct BodyLimitState {
    pub max_request_size: usize,
}

/// Rejects oversized bodies early via Content-Length. Chunked uploads are
/// bounded by the server's own read limits.
pub async fn body_size_middleware(
    State(state): State<BodyLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(length) = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    {
        if length > state.max_request_size {
            warn!(
                content_length = length,
                max = state.max_request_size,
                "request body too large"
            );
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_window() {
        let limiter = RateLimiter::new(3);

        assert!(limiter.check("127.0.0.1").allowed);
        assert!(limiter.check("127.0.0.1").allowed);
        let third = limiter.check("127.0.0.1");
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);

        let fourth = limiter.check("127.0.0.1");
        assert!(!fourth.allowed);

        // Each IP gets its own window.
        assert!(limiter.check("192.168.1.1").allowed);
    }

    #[test]
    fn test_cleanup_drops_expired_windows() {
        let limiter = RateLimiter::new(3);
        limiter.check("10.0.0.1");
        limiter
            .windows
            .insert("10.0.0.9".to_string(), (1, Instant::now() - Duration::from_secs(180)));

        limiter.cleanup();

        // Only the window aged past twice the period is dropped.
        assert!(limiter.windows.contains_key("10.0.0.1"));
        assert!(!limiter.windows.contains_key("10.0.0.9"));
    }
}
