//! Storage boundary.
//!
//! One trait, two backends: Postgres for deployments, in-memory for
//! development and tests. Startup tries Postgres when enabled and falls
//! back to the in-memory store with a warning, so the service always comes
//! up. The contract every backend must honor:
//!
//! - `adjust_points` is a single atomic counter increment (lost updates are
//!   impossible, negative results are legal).
//! - `try_debit_gems` checks and mutates in one linearizable step; the
//!   balance can never be driven below zero.
//! - `try_resolve_question` transitions to Resolue at most once across all
//!   concurrent callers.
//!
//! Log appends are separate operations on purpose; see `ledger`.

pub mod memory;
pub mod postgres;
pub mod records;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::forum::models::{AnswerRecord, AnswerStatus, QuestionRecord, QuestionStatus};
use crate::ledger::gems::{DebitOutcome, GemAccount, GemTransaction};
use crate::ledger::points::PointTransaction;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use records::{ContentRecord, PartnerOffer, ReportRecord, UserRecord};

pub type SharedStore = Arc<dyn StorageBackend>;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// "memory" or "postgres"; drives startup logging and demo seeding.
    fn backend_name(&self) -> &'static str;

    // Users. Inserts keep an existing row untouched so seeding is idempotent.
    async fn insert_user(&self, user: UserRecord) -> Result<()>;
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>>;
    /// Atomic signed increment of the points counter. Returns the new value.
    async fn adjust_points(&self, user_id: Uuid, delta: i64) -> Result<i64>;
    /// Idempotent set-add. Returns true when the slug was newly added.
    async fn award_badge(&self, user_id: Uuid, slug: &str) -> Result<bool>;
    async fn unlock_customization(&self, user_id: Uuid, slug: &str) -> Result<bool>;

    // Sessions, written by the external auth service.
    async fn insert_session(&self, token_digest: &str, user_id: Uuid) -> Result<()>;
    async fn resolve_session(&self, token_digest: &str) -> Result<Option<Uuid>>;

    // Point audit log.
    async fn append_point_transaction(&self, transaction: PointTransaction) -> Result<()>;
    async fn point_history(&self, user_id: Uuid) -> Result<Vec<PointTransaction>>;

    // Gem accounts and audit log.
    async fn gem_account(&self, user_id: Uuid) -> Result<GemAccount>;
    /// Unconditional credit; creates the account on first use.
    async fn credit_gems(&self, user_id: Uuid, amount: i64) -> Result<i64>;
    /// Conditional debit: applies only while the balance covers `amount`.
    async fn try_debit_gems(&self, user_id: Uuid, amount: i64) -> Result<DebitOutcome>;
    async fn append_gem_transaction(&self, transaction: GemTransaction) -> Result<()>;
    async fn gem_history(&self, user_id: Uuid) -> Result<Vec<GemTransaction>>;

    // Questions.
    async fn insert_question(&self, question: QuestionRecord) -> Result<()>;
    async fn get_question(&self, question_id: Uuid) -> Result<Option<QuestionRecord>>;
    async fn set_question_status(&self, question_id: Uuid, status: QuestionStatus) -> Result<()>;
    /// Conditional transition to Resolue. True when this call won the race,
    /// false when the question was already resolved.
    async fn try_resolve_question(&self, question_id: Uuid) -> Result<bool>;

    // Answers.
    async fn insert_answer(&self, answer: AnswerRecord) -> Result<()>;
    async fn get_answer(&self, answer_id: Uuid) -> Result<Option<AnswerRecord>>;
    async fn answers_for_question(&self, question_id: Uuid) -> Result<Vec<AnswerRecord>>;
    async fn set_answer_status(&self, answer_id: Uuid, status: AnswerStatus) -> Result<()>;
    async fn increment_answer_likes(&self, answer_id: Uuid) -> Result<i64>;
    async fn delete_answer(&self, answer_id: Uuid) -> Result<()>;
    /// Badge aggregate: answers by this author holding Validee or
    /// MeilleureReponse, counted live.
    async fn count_endorsed_answers(&self, author_id: Uuid) -> Result<i64>;

    // Moderation reports, written by the external report workflow.
    async fn insert_report(&self, report: ReportRecord) -> Result<()>;
    async fn has_active_report(&self, answer_id: Uuid) -> Result<bool>;

    // Content items, written by the external content CRUD.
    async fn insert_content(&self, content: ContentRecord) -> Result<()>;
    async fn count_content(&self, author_id: Uuid) -> Result<i64>;

    // Partner offer catalog.
    async fn insert_partner_offer(&self, offer: PartnerOffer) -> Result<()>;
    async fn get_partner_offer(&self, offer_id: Uuid) -> Result<Option<PartnerOffer>>;
}

/// Connects the configured backend, falling back to the in-memory store
/// when Postgres is disabled or unreachable.
pub async fn connect(config: &DatabaseConfig) -> SharedStore {
    if config.postgres_enabled {
        if let Some(url) = &config.postgres_url {
            match postgres::PostgresStore::connect(url).await {
                Ok(store) => {
                    info!("Connected to Postgres store");
                    return Arc::new(store);
                }
                Err(e) => {
                    warn!(error = %e, "Could not connect to Postgres, using in-memory store");
                }
            }
        } else {
            warn!("Postgres enabled but no URL configured, using in-memory store");
        }
    }

    info!("Using in-memory store (dev mode)");
    Arc::new(memory::MemoryStore::new())
}

/// Demo fixtures for local development: a user per role with well-known
/// bearer tokens, starting balances, and a partner offer pair. Runs once
/// at startup against a fresh in-memory store.
pub async fn seed_demo_data(store: &SharedStore) -> Result<()> {
    use crate::auth::{token_digest, Role};

    let fixtures = [
        (Uuid::from_u128(0x11), "lea", Role::Student, 100, 50, "dev-token-lea"),
        (Uuid::from_u128(0x12), "noe", Role::Student, 40, 5, "dev-token-noe"),
        (Uuid::from_u128(0x13), "mina", Role::Teacher, 800, 10, "dev-token-mina"),
        (Uuid::from_u128(0x14), "marius", Role::Moderator, 300, 0, "dev-token-marius"),
        (Uuid::from_u128(0x15), "ada", Role::Admin, 1500, 0, "dev-token-ada"),
    ];

    for (id, name, role, points, gems, token) in fixtures {
        let mut user = UserRecord::new(id, name, role);
        user.points = points;
        store.insert_user(user).await?;
        store.insert_session(&token_digest(token), id).await?;
        if gems > 0 {
            store.credit_gems(id, gems).await?;
        }
    }

    store
        .insert_partner_offer(PartnerOffer {
            id: Uuid::from_u128(0x21),
            partner: "CinéClub".to_string(),
            title: "Place de cinéma".to_string(),
            gem_cost: 30,
            active: true,
        })
        .await?;
    store
        .insert_partner_offer(PartnerOffer {
            id: Uuid::from_u128(0x22),
            partner: "Musée des sciences".to_string(),
            title: "Entrée musée".to_string(),
            gem_cost: 15,
            active: false,
        })
        .await?;

    info!("Demo fixtures seeded (5 users, 2 partner offers)");
    Ok(())
}
