//! Profile API Endpoints
//!
//! Read side of the economy: public profile with derived rank and
//! progress, plus the two audit histories. Histories are restricted to
//! the account owner and ledger-viewing staff.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability, Role};
use crate::error::{PalmaresError, Result};
use crate::ledger::gems::{GemLedger, GemTransaction};
use crate::ledger::points::{PointLedger, PointTransaction};
use crate::progression::{progress_to_next, RankProgress};
use crate::store::SharedStore;

/// API state for profile endpoints
#[derive(Clone)]
pub struct ProfileApiState {
    pub store: SharedStore,
    pub points: PointLedger,
    pub gems: GemLedger,
}

// Response types

#[derive(Debug, Serialize)]
pub struct GemBalances {
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: Role,
    pub points: i64,
    pub rank: RankProgress,
    pub badges: Vec<String>,
    pub customizations: Vec<String>,
    pub gems: GemBalances,
    pub member_since: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PointHistoryResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub transactions: Vec<PointTransaction>,
}

#[derive(Debug, Serialize)]
pub struct GemHistoryResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub transactions: Vec<GemTransaction>,
}

fn authorize_history(auth: &AuthUser, target: Uuid) -> Result<()> {
    if auth.user_id == target || auth.role.allows(Capability::ViewLedgers) {
        Ok(())
    } else {
        Err(PalmaresError::Forbidden(
            "ledger history is limited to the owner and staff".to_string(),
        ))
    }
}

// Endpoints

/// GET /users/{user_id} - Public profile with derived rank and balances
pub async fn get_profile(
    State(state): State<ProfileApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>> {
    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| PalmaresError::NotFound(format!("user {} not found", user_id)))?;
    let account = state.store.gem_account(user_id).await?;

    Ok(Json(ProfileResponse {
        user_id: user.id,
        display_name: user.display_name,
        role: user.role,
        points: user.points,
        rank: progress_to_next(user.points),
        badges: user.badges.into_iter().collect(),
        customizations: user.customizations.into_iter().collect(),
        gems: GemBalances {
            balance: account.balance,
            total_earned: account.total_earned,
            total_spent: account.total_spent,
        },
        member_since: user.created_at,
    }))
}

/// GET /users/{user_id}/points/history - Point audit log, owner or staff
pub async fn get_point_history(
    State(state): State<ProfileApiState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PointHistoryResponse>> {
    authorize_history(&auth, user_id)?;
    let balance = state.points.balance(user_id).await?;
    let transactions = state.points.history(user_id).await?;
    Ok(Json(PointHistoryResponse { user_id, balance, transactions }))
}

/// GET /users/{user_id}/gems/history - Gem audit log, owner or staff
pub async fn get_gem_history(
    State(state): State<ProfileApiState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<GemHistoryResponse>> {
    authorize_history(&auth, user_id)?;
    let account = state.gems.account(user_id).await?;
    let transactions = state.gems.history(user_id).await?;
    Ok(Json(GemHistoryResponse {
        user_id,
        balance: account.balance,
        transactions,
    }))
}

/// Create the profile API router
pub fn create_profile_router(state: ProfileApiState) -> Router {
    Router::new()
        .route("/{user_id}", get(get_profile))
        .route("/{user_id}/points/history", get(get_point_history))
        .route("/{user_id}/gems/history", get(get_gem_history))
        .with_state(state)
}
