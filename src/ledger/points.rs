//! Point Ledger
//!
//! Append-only transaction log plus a denormalized signed counter on the
//! user record. The counter increment is a single atomic storage operation;
//! the log append is a second, independent operation. A crash between the
//! two leaves the log behind the counter: the counter stays authoritative
//! for spending power, the log is best-effort history. This gap is part of
//! the storage contract and is not papered over with a transaction.
//!
//! Reversals never touch the original row. A compensation is a fresh entry
//! with the negated amount under its own action tag, so independent
//! observers can replay the log and reconcile against the counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{PalmaresError, Result};
use crate::store::SharedStore;

/// Closed set of events that move points. Tags are stored verbatim and are
/// part of the audit contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointAction {
    CreateQuestion,
    CreateAnswer,
    ValidateAnswer,
    DeleteAnswer,
    CreateCourse,
    DeleteCourse,
    ConvertPoints,
}

impl PointAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointAction::CreateQuestion => "createQuestion",
            PointAction::CreateAnswer => "createAnswer",
            PointAction::ValidateAnswer => "validateAnswer",
            PointAction::DeleteAnswer => "deleteAnswer",
            PointAction::CreateCourse => "createCourse",
            PointAction::DeleteCourse => "deleteCourse",
            PointAction::ConvertPoints => "convertPoints",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<PointAction> {
        match value {
            "createQuestion" => Some(PointAction::CreateQuestion),
            "createAnswer" => Some(PointAction::CreateAnswer),
            "validateAnswer" => Some(PointAction::ValidateAnswer),
            "deleteAnswer" => Some(PointAction::DeleteAnswer),
            "createCourse" => Some(PointAction::CreateCourse),
            "deleteCourse" => Some(PointAction::DeleteCourse),
            "convertPoints" => Some(PointAction::ConvertPoints),
            _ => None,
        }
    }
}

/// Derived from the amount's sign at write time. Callers never supply it,
/// so a positive amount tagged `perte` is unrepresentable at the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointTransactionKind {
    Gain,
    Perte,
}

impl PointTransactionKind {
    pub fn from_amount(points: i64) -> PointTransactionKind {
        if points < 0 {
            PointTransactionKind::Perte
        } else {
            PointTransactionKind::Gain
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PointTransactionKind::Gain => "gain",
            PointTransactionKind::Perte => "perte",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<PointTransactionKind> {
        match value {
            "gain" => Some(PointTransactionKind::Gain),
            "perte" => Some(PointTransactionKind::Perte),
            _ => None,
        }
    }
}

/// Optional links back to whatever triggered the event.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PointRefs {
    pub question_id: Option<Uuid>,
    pub answer_id: Option<Uuid>,
    pub content_id: Option<Uuid>,
}

impl PointRefs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn question(question_id: Uuid) -> Self {
        Self { question_id: Some(question_id), ..Self::default() }
    }

    pub fn answer(question_id: Uuid, answer_id: Uuid) -> Self {
        Self {
            question_id: Some(question_id),
            answer_id: Some(answer_id),
            ..Self::default()
        }
    }

    pub fn content(content_id: Uuid) -> Self {
        Self { content_id: Some(content_id), ..Self::default() }
    }
}

/// Immutable audit entry. Never updated or deleted once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: PointAction,
    pub kind: PointTransactionKind,
    /// Signed amount; the sign always matches `kind` by construction.
    pub points: i64,
    pub question_id: Option<Uuid>,
    pub answer_id: Option<Uuid>,
    pub content_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PointLedger {
    store: SharedStore,
}

impl PointLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Applies `signed_points` to the user's counter, then appends the audit
    /// entry. The increment runs first so an unknown user fails before
    /// anything is written; if the process dies between the two operations
    /// the counter has moved and the log entry is missing, which the storage
    /// contract accepts. Negative balances are allowed.
    pub async fn record(
        &self,
        user_id: Uuid,
        action: PointAction,
        signed_points: i64,
        refs: PointRefs,
    ) -> Result<Uuid> {
        let new_balance = self.store.adjust_points(user_id, signed_points).await?;

        let transaction = PointTransaction {
            id: Uuid::new_v4(),
            user_id,
            action,
            kind: PointTransactionKind::from_amount(signed_points),
            points: signed_points,
            question_id: refs.question_id,
            answer_id: refs.answer_id,
            content_id: refs.content_id,
            created_at: Utc::now(),
        };
        let transaction_id = transaction.id;
        self.store.append_point_transaction(transaction).await?;

        debug!(
            user_id = %user_id,
            action = action.as_str(),
            points = signed_points,
            new_balance,
            "point event recorded"
        );
        Ok(transaction_id)
    }

    /// Current counter value, the authoritative balance.
    pub async fn balance(&self, user_id: Uuid) -> Result<i64> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("user {} not found", user_id)))?;
        Ok(user.points)
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<PointTransaction>> {
        self.store.point_history(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::Role;
    use crate::store::memory::MemoryStore;
    use crate::store::records::UserRecord;

    async fn seeded_store() -> (SharedStore, Uuid) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let user = UserRecord::new(Uuid::new_v4(), "lea", Role::Student);
        let user_id = user.id;
        store.insert_user(user).await.unwrap();
        (store, user_id)
    }

    #[test]
    fn test_kind_derived_from_sign() {
        assert_eq!(PointTransactionKind::from_amount(7), PointTransactionKind::Gain);
        assert_eq!(PointTransactionKind::from_amount(0), PointTransactionKind::Gain);
        assert_eq!(PointTransactionKind::from_amount(-7), PointTransactionKind::Perte);
    }

    #[test]
    fn test_action_tags_round_trip() {
        for action in [
            PointAction::CreateQuestion,
            PointAction::CreateAnswer,
            PointAction::ValidateAnswer,
            PointAction::DeleteAnswer,
            PointAction::CreateCourse,
            PointAction::DeleteCourse,
            PointAction::ConvertPoints,
        ] {
            assert_eq!(PointAction::from_str_opt(action.as_str()), Some(action));
        }
        assert_eq!(PointAction::from_str_opt("likeAnswer"), None);
    }

    #[tokio::test]
    async fn test_record_moves_counter_and_appends_log() {
        let (store, user_id) = seeded_store().await;
        let ledger = PointLedger::new(store.clone());

        ledger
            .record(user_id, PointAction::CreateAnswer, 2, PointRefs::none())
            .await
            .unwrap();
        ledger
            .record(user_id, PointAction::ValidateAnswer, 10, PointRefs::none())
            .await
            .unwrap();

        assert_eq!(ledger.balance(user_id).await.unwrap(), 12);
        let history = ledger.history(user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|tx| tx.kind == PointTransactionKind::Gain));
    }

    #[tokio::test]
    async fn test_balance_goes_negative_without_validation() {
        let (store, user_id) = seeded_store().await;
        let ledger = PointLedger::new(store);

        ledger
            .record(user_id, PointAction::DeleteCourse, -40, PointRefs::none())
            .await
            .unwrap();

        assert_eq!(ledger.balance(user_id).await.unwrap(), -40);
        let history = ledger.history(user_id).await.unwrap();
        assert_eq!(history[0].kind, PointTransactionKind::Perte);
        assert_eq!(history[0].points, -40);
    }

    #[tokio::test]
    async fn test_unknown_user_appends_nothing() {
        let (store, _) = seeded_store().await;
        let ledger = PointLedger::new(store.clone());
        let ghost = Uuid::new_v4();

        let err = ledger
            .record(ghost, PointAction::CreateAnswer, 2, PointRefs::none())
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::NotFound(_)));
        assert!(store.point_history(ghost).await.unwrap().is_empty());
    }
}
