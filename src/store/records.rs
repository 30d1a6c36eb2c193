//! Records shared across the storage boundary.
//!
//! The user row carries the two denormalized balances' home: `points` lives
//! directly on the user, the gem side lives in its own account record (see
//! `ledger::gems`). Reports and content items are written by external
//! workflows and only read here, as the moderation gate and the badge
//! aggregates respectively.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
    /// Signed reputation balance. Deletion penalties may push it negative.
    /// Mutated only through the point ledger's atomic increment.
    pub points: i64,
    /// Awarded badge slugs. Set semantics make awarding idempotent.
    pub badges: BTreeSet<String>,
    /// Unlocked profile customization slugs.
    pub customizations: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(id: Uuid, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
            points: 0,
            badges: BTreeSet::new(),
            customizations: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Active,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Active => "active",
            ReportStatus::Resolved => "resolved",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<ReportStatus> {
        match value {
            "active" => Some(ReportStatus::Active),
            "resolved" => Some(ReportStatus::Resolved),
            _ => None,
        }
    }
}

/// Moderation report, written by the external report workflow. A moderator
/// may delete an answer only while an Active report references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub answer_id: Uuid,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn active_for(answer_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            answer_id,
            status: ReportStatus::Active,
            created_at: Utc::now(),
        }
    }
}

/// Course/fiche item created by the external content CRUD. Stored here only
/// so content badges and deletion penalties have a real aggregate to count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl ContentRecord {
    pub fn new(author_id: Uuid, kind: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            kind: kind.into(),
            created_at: Utc::now(),
        }
    }
}

/// Marketplace offer redeemable for gems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerOffer {
    pub id: Uuid,
    pub partner: String,
    pub title: String,
    pub gem_cost: i64,
    pub active: bool,
}
