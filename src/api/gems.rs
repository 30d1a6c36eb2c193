//! Gem API Endpoints
//!
//! Spending surfaces for the gem economy: partner offer redemption,
//! customization purchases, and point-to-gem conversion. Every spend goes
//! through the conditional debit, so a shortfall refuses the whole
//! operation with the exact balance gap and writes nothing.

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::EconomySettings;
use crate::error::{PalmaresError, Result};
use crate::ledger::gems::{customizations, GemLedger, GemTransactionKind};
use crate::ledger::points::{PointAction, PointLedger, PointRefs};
use crate::store::SharedStore;

/// API state for gem endpoints
#[derive(Clone)]
pub struct GemsApiState {
    pub store: SharedStore,
    pub gems: GemLedger,
    pub points: PointLedger,
    pub settings: EconomySettings,
}

// Request/response types

#[derive(Debug, Deserialize)]
pub struct RedeemOfferRequest {
    pub offer_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RedeemOfferResponse {
    pub offer_id: Uuid,
    pub transaction_id: Uuid,
    /// Voucher code to present to the partner.
    pub code: String,
    pub gems_spent: i64,
    pub new_balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub item: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub item: String,
    pub transaction_id: Uuid,
    pub gems_spent: i64,
    pub new_balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    /// Gems requested; costs `gem_conversion_rate` points each.
    pub gems: i64,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub points_spent: i64,
    pub gems_credited: i64,
    pub gem_balance: i64,
}

fn redemption_code() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_uppercase()
}

// Endpoints

/// POST /gems/partner-offer - Redeem a partner offer for gems
pub async fn redeem_partner_offer(
    State(state): State<GemsApiState>,
    auth: AuthUser,
    Json(payload): Json<RedeemOfferRequest>,
) -> Result<Json<RedeemOfferResponse>> {
    let offer = state
        .store
        .get_partner_offer(payload.offer_id)
        .await?
        .ok_or_else(|| {
            PalmaresError::NotFound(format!("partner offer {} not found", payload.offer_id))
        })?;
    if !offer.active {
        return Err(PalmaresError::Validation("partner offer is not active".to_string()));
    }

    let receipt = state
        .gems
        .spend(
            auth.user_id,
            offer.gem_cost,
            GemTransactionKind::PartnerOffer,
            &format!("Offre partenaire: {}", offer.title),
            serde_json::json!({ "offer_id": offer.id, "partner": offer.partner }),
        )
        .await?;

    Ok(Json(RedeemOfferResponse {
        offer_id: offer.id,
        transaction_id: receipt.transaction_id,
        code: redemption_code(),
        gems_spent: offer.gem_cost,
        new_balance: receipt.new_balance,
    }))
}

/// POST /gems/purchase - Buy a profile customization
pub async fn purchase_customization(
    State(state): State<GemsApiState>,
    auth: AuthUser,
    Json(payload): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>> {
    let item = customizations::find(&payload.item).ok_or_else(|| {
        PalmaresError::Validation(format!("unknown customization item: {}", payload.item))
    })?;

    let user = state
        .store
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| PalmaresError::NotFound(format!("user {} not found", auth.user_id)))?;
    if user.customizations.contains(item.slug) {
        return Err(PalmaresError::Conflict(format!("{} is already unlocked", item.slug)));
    }

    let receipt = state
        .gems
        .spend(
            auth.user_id,
            item.gem_cost,
            GemTransactionKind::Purchase,
            &format!("Personnalisation: {}", item.name),
            serde_json::json!({ "item": item.slug }),
        )
        .await?;

    // The debit and the unlock are separate writes. If the unlock loses a
    // race or fails, the spend stands, the caller still gets the receipt,
    // and support reconciles from the log.
    match state.store.unlock_customization(auth.user_id, item.slug).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                user_id = %auth.user_id,
                item = item.slug,
                transaction_id = %receipt.transaction_id,
                "customization already unlocked after paid debit"
            );
        }
        Err(e) => {
            warn!(
                user_id = %auth.user_id,
                item = item.slug,
                transaction_id = %receipt.transaction_id,
                error = %e,
                "customization unlock failed after paid debit"
            );
        }
    }

    Ok(Json(PurchaseResponse {
        item: item.slug.to_string(),
        transaction_id: receipt.transaction_id,
        gems_spent: item.gem_cost,
        new_balance: receipt.new_balance,
    }))
}

/// POST /gems/convert - Convert points into gems
pub async fn convert_points(
    State(state): State<GemsApiState>,
    auth: AuthUser,
    Json(payload): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>> {
    if payload.gems <= 0 {
        return Err(PalmaresError::Validation(
            "gem amount must be positive".to_string(),
        ));
    }
    // The amount is client-supplied; the cost multiply must not wrap.
    let points_cost = payload
        .gems
        .checked_mul(state.settings.gem_conversion_rate)
        .ok_or_else(|| PalmaresError::Validation("gem amount out of range".to_string()))?;

    // Affordability is checked by read; the point counter itself accepts
    // any delta.
    let balance = state.points.balance(auth.user_id).await?;
    if balance < points_cost {
        return Err(PalmaresError::Validation(format!(
            "conversion needs {} points, balance is {}",
            points_cost, balance
        )));
    }

    state
        .points
        .record(auth.user_id, PointAction::ConvertPoints, -points_cost, PointRefs::none())
        .await?;
    let gem_balance = state
        .gems
        .credit(
            auth.user_id,
            payload.gems,
            GemTransactionKind::Conversion,
            "Conversion de points",
            serde_json::json!({ "points_spent": points_cost }),
        )
        .await?;

    Ok(Json(ConvertResponse {
        points_spent: points_cost,
        gems_credited: payload.gems,
        gem_balance,
    }))
}

/// Create the gems API router
pub fn create_gems_router(state: GemsApiState) -> Router {
    Router::new()
        .route("/partner-offer", post(redeem_partner_offer))
        .route("/purchase", post(purchase_customization))
        .route("/convert", post(convert_points))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redemption_code_shape() {
        let code = redemption_code();
        assert_eq!(code.len(), 12);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
