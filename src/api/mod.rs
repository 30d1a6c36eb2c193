//! HTTP API for the Palmarès economy
//!
//! Provides REST APIs for:
//! - Forum (staked questions, answers, arbitration, moderation)
//! - Gems (partner offers, customization purchases, point conversion)
//! - Profiles (derived rank, badges, audit histories)
//! - Request middleware (bearer auth, rate limiting, security headers)

pub mod forum;
pub mod gems;
pub mod middleware;
pub mod profile;

pub use forum::{create_forum_router, ForumApiState};
pub use gems::{create_gems_router, GemsApiState};
pub use middleware::{
    auth_middleware, body_size_middleware, rate_limit_middleware, security_headers_middleware,
    AuthState, BodyLimitState, RateLimitState, RateLimiter,
};
pub use profile::{create_profile_router, ProfileApiState};

use axum::{middleware as layer, routing::get, Json, Router};

use crate::config::EconomyConfig;
use crate::forum::{ArbitrationEngine, SharedNotifier};
use crate::ledger::{GemLedger, PointLedger};
use crate::store::SharedStore;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assembles the application router: all endpoint groups plus the
/// middleware that works without a live socket (auth, body cap, headers).
/// Rate limiting needs per-connection info and is layered in `main`.
/// Integration tests drive this router directly.
pub fn build_app(store: SharedStore, notifier: SharedNotifier, config: &EconomyConfig) -> Router {
    let engine = ArbitrationEngine::new(store.clone(), notifier, config.economy.clone());
    let points = PointLedger::new(store.clone());
    let gems = GemLedger::new(store.clone());

    let auth_state = AuthState { store: store.clone() };
    let body_state = BodyLimitState {
        max_request_size: config.security.max_request_size,
    };

    Router::new()
        .merge(create_forum_router(ForumApiState { engine }))
        .nest(
            "/gems",
            create_gems_router(GemsApiState {
                store: store.clone(),
                gems: gems.clone(),
                points: points.clone(),
                settings: config.economy.clone(),
            }),
        )
        .nest(
            "/users",
            create_profile_router(ProfileApiState { store, points, gems }),
        )
        .route("/health", get(health))
        .layer(layer::from_fn_with_state(body_state, body_size_middleware))
        .layer(layer::from_fn_with_state(auth_state, auth_middleware))
        .layer(layer::from_fn(security_headers_middleware))
}
