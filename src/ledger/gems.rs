//! Gem Ledger
//!
//! Gems are the convertible purchase medium, so they get the strict
//! invariant the point counter deliberately lacks: the balance never goes
//! negative. A spend is one conditional storage operation (debit and
//! `total_spent` bump only while the balance covers the amount), so two
//! concurrent spends can never both succeed on funds that cover only one.
//! The audit append that follows a successful debit is a separate,
//! best-effort operation, same as on the point side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PalmaresError, Result};
use crate::store::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GemTransactionKind {
    /// Customization bought in the gem shop.
    Purchase,
    /// Marketplace offer redemption.
    PartnerOffer,
    /// Points converted into gems.
    Conversion,
    /// Earned through platform activity, e.g. a best answer.
    Reward,
    /// Manual support correction.
    Adjustment,
}

impl GemTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GemTransactionKind::Purchase => "purchase",
            GemTransactionKind::PartnerOffer => "partner_offer",
            GemTransactionKind::Conversion => "conversion",
            GemTransactionKind::Reward => "reward",
            GemTransactionKind::Adjustment => "adjustment",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<GemTransactionKind> {
        match value {
            "purchase" => Some(GemTransactionKind::Purchase),
            "partner_offer" => Some(GemTransactionKind::PartnerOffer),
            "conversion" => Some(GemTransactionKind::Conversion),
            "reward" => Some(GemTransactionKind::Reward),
            "adjustment" => Some(GemTransactionKind::Adjustment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GemTransactionStatus {
    Completed,
    /// Reserved for externally settled flows (payment webhooks).
    Pending,
    Failed,
}

impl GemTransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GemTransactionStatus::Completed => "completed",
            GemTransactionStatus::Pending => "pending",
            GemTransactionStatus::Failed => "failed",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<GemTransactionStatus> {
        match value {
            "completed" => Some(GemTransactionStatus::Completed),
            "pending" => Some(GemTransactionStatus::Pending),
            "failed" => Some(GemTransactionStatus::Failed),
            _ => None,
        }
    }
}

/// Denormalized per-user gem balances. `balance >= 0` always holds;
/// `total_earned`/`total_spent` only grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemAccount {
    pub user_id: Uuid,
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
}

impl GemAccount {
    pub fn empty(user_id: Uuid) -> Self {
        Self { user_id, balance: 0, total_earned: 0, total_spent: 0 }
    }
}

/// Immutable audit entry; `gems` is negative for spends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: GemTransactionKind,
    pub gems: i64,
    pub description: String,
    pub status: GemTransactionStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Result of the conditional debit at the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied { new_balance: i64 },
    Insufficient { current: i64 },
}

/// Applied spend: the audit row's id plus the balance after the debit.
#[derive(Debug, Clone, Copy)]
pub struct SpendReceipt {
    pub transaction_id: Uuid,
    pub new_balance: i64,
}

#[derive(Clone)]
pub struct GemLedger {
    store: SharedStore,
}

impl GemLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Conditional spend. Refusal carries the shortfall and leaves no trace
    /// in the account or the log.
    pub async fn spend(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: GemTransactionKind,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<SpendReceipt> {
        if amount <= 0 {
            return Err(PalmaresError::Validation(
                "gem spend amount must be positive".to_string(),
            ));
        }

        match self.store.try_debit_gems(user_id, amount).await? {
            DebitOutcome::Insufficient { current } => {
                debug!(
                    user_id = %user_id,
                    required = amount,
                    current,
                    "gem spend refused, insufficient balance"
                );
                Err(PalmaresError::InsufficientGems { required: amount, current })
            }
            DebitOutcome::Applied { new_balance } => {
                let transaction = GemTransaction {
                    id: Uuid::new_v4(),
                    user_id,
                    kind,
                    gems: -amount,
                    description: description.to_string(),
                    status: GemTransactionStatus::Completed,
                    metadata,
                    created_at: Utc::now(),
                };
                let transaction_id = transaction.id;
                self.store.append_gem_transaction(transaction).await?;
                info!(
                    user_id = %user_id,
                    transaction_id = %transaction_id,
                    amount,
                    new_balance,
                    kind = kind.as_str(),
                    "gems spent"
                );
                Ok(SpendReceipt { transaction_id, new_balance })
            }
        }
    }

    /// Unconditional counterpart: bumps balance and `total_earned`.
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: GemTransactionKind,
        description: &str,
        metadata: serde_json::Value,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(PalmaresError::Validation(
                "gem credit amount must be positive".to_string(),
            ));
        }

        let new_balance = self.store.credit_gems(user_id, amount).await?;
        let transaction = GemTransaction {
            id: Uuid::new_v4(),
            user_id,
            kind,
            gems: amount,
            description: description.to_string(),
            status: GemTransactionStatus::Completed,
            metadata,
            created_at: Utc::now(),
        };
        self.store.append_gem_transaction(transaction).await?;
        info!(
            user_id = %user_id,
            amount,
            new_balance,
            kind = kind.as_str(),
            "gems credited"
        );
        Ok(new_balance)
    }

    pub async fn account(&self, user_id: Uuid) -> Result<GemAccount> {
        self.store.gem_account(user_id).await
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<GemTransaction>> {
        self.store.gem_history(user_id).await
    }
}

/// Catalog of profile customizations purchasable with gems. Items change
/// with releases, not at runtime.
pub mod customizations {
    #[derive(Debug, Clone, Copy)]
    pub struct CustomizationItem {
        pub slug: &'static str,
        pub name: &'static str,
        pub gem_cost: i64,
    }

    pub const CATALOG: [CustomizationItem; 6] = [
        CustomizationItem { slug: "theme-nuit", name: "Thème nuit", gem_cost: 20 },
        CustomizationItem { slug: "theme-ocean", name: "Thème océan", gem_cost: 25 },
        CustomizationItem { slug: "avatar-renard", name: "Avatar renard", gem_cost: 35 },
        CustomizationItem { slug: "avatar-chouette", name: "Avatar chouette", gem_cost: 35 },
        CustomizationItem { slug: "cadre-or", name: "Cadre doré", gem_cost: 60 },
        CustomizationItem { slug: "titre-anime", name: "Titre animé", gem_cost: 80 },
    ];

    pub fn find(slug: &str) -> Option<&'static CustomizationItem> {
        CATALOG.iter().find(|item| item.slug == slug)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::auth::Role;
    use crate::store::memory::MemoryStore;
    use crate::store::records::UserRecord;

    async fn seeded_ledger() -> (GemLedger, SharedStore, Uuid) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let user = UserRecord::new(Uuid::new_v4(), "noe", Role::Student);
        let user_id = user.id;
        store.insert_user(user).await.unwrap();
        (GemLedger::new(store.clone()), store, user_id)
    }

    #[tokio::test]
    async fn test_credit_then_spend_updates_totals() {
        let (ledger, _store, user_id) = seeded_ledger().await;

        let balance = ledger
            .credit(user_id, 50, GemTransactionKind::Reward, "weekly reward", json!({}))
            .await
            .unwrap();
        assert_eq!(balance, 50);

        let receipt = ledger
            .spend(user_id, 20, GemTransactionKind::Purchase, "theme", json!({}))
            .await
            .unwrap();
        assert_eq!(receipt.new_balance, 30);

        let account = ledger.account(user_id).await.unwrap();
        assert_eq!(account.balance, 30);
        assert_eq!(account.total_earned, 50);
        assert_eq!(account.total_spent, 20);
    }

    #[tokio::test]
    async fn test_refused_spend_has_no_side_effects() {
        let (ledger, _store, user_id) = seeded_ledger().await;
        ledger
            .credit(user_id, 5, GemTransactionKind::Reward, "seed", json!({}))
            .await
            .unwrap();

        let err = ledger
            .spend(user_id, 8, GemTransactionKind::PartnerOffer, "offer", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PalmaresError::InsufficientGems { required: 8, current: 5 }
        ));

        let account = ledger.account(user_id).await.unwrap();
        assert_eq!(account.balance, 5);
        assert_eq!(account.total_spent, 0);
        // Only the credit row exists.
        assert_eq!(ledger.history(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_spend_rows_carry_negative_amounts() {
        let (ledger, _store, user_id) = seeded_ledger().await;
        ledger
            .credit(user_id, 40, GemTransactionKind::Conversion, "converted", json!({}))
            .await
            .unwrap();
        ledger
            .spend(user_id, 15, GemTransactionKind::Purchase, "avatar", json!({}))
            .await
            .unwrap();

        let history = ledger.history(user_id).await.unwrap();
        let spend = history.iter().find(|tx| tx.kind == GemTransactionKind::Purchase).unwrap();
        assert_eq!(spend.gems, -15);
        assert_eq!(spend.status, GemTransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let (ledger, _store, user_id) = seeded_ledger().await;
        for amount in [0, -3] {
            let err = ledger
                .spend(user_id, amount, GemTransactionKind::Purchase, "x", json!({}))
                .await
                .unwrap_err();
            assert!(matches!(err, PalmaresError::Validation(_)));
            let err = ledger
                .credit(user_id, amount, GemTransactionKind::Reward, "x", json!({}))
                .await
                .unwrap_err();
            assert!(matches!(err, PalmaresError::Validation(_)));
        }
    }

    #[test]
    fn test_customization_catalog_lookup() {
        let item = customizations::find("theme-nuit").unwrap();
        assert_eq!(item.gem_cost, 20);
        assert!(customizations::find("theme-inconnu").is_none());
    }
}
