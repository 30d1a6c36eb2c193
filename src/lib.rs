//! Palmarès economy core
//!
//! Reputation economy for a peer-help learning platform: an append-only
//! point ledger, a spendable gem currency, a staked question/answer forum
//! with arbitration, and derived ranks and badges.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Error taxonomy & HTTP mapping
//! ├── ledger/        - The two currencies
//! │   ├── points.rs  - Append-only reputation ledger
//! │   └── gems.rs    - Guarded gem accounts & catalog
//! ├── forum/         - Staked Q&A arbitration
//! │   ├── models.rs  - Questions, answers, status machines
//! │   ├── engine.rs  - Arbitration flows & payouts
//! │   └── notify.rs  - Outcome notification sinks
//! ├── progression/   - Derived standing
//! │   ├── rank.rs    - Rank ladder over lifetime points
//! │   └── badges.rs  - Threshold badge evaluation
//! ├── auth/          - Sessions, roles, capabilities
//! ├── api/           - HTTP API endpoints
//! │   ├── forum.rs   - Question/answer/moderation routes
//! │   ├── gems.rs    - Offers, purchases, conversion
//! │   ├── profile.rs - Profiles & ledger histories
//! │   └── middleware.rs - Auth, rate limiting, headers
//! └── store/         - Persistence (memory & PostgreSQL)
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod forum;
pub mod ledger;
pub mod progression;
pub mod store;

// Re-export main types for convenience
pub use config::EconomyConfig;
pub use error::{PalmaresError, Result};

// Re-export ledger types
pub use ledger::gems::customizations;
pub use ledger::{
    DebitOutcome, GemAccount, GemLedger, GemTransaction, GemTransactionKind, GemTransactionStatus,
    PointAction, PointLedger, PointRefs, PointTransaction, PointTransactionKind, SpendReceipt,
};

// Re-export forum types
pub use forum::{
    AnswerRecord, AnswerStatus, ArbitrationEngine, Notification, NotificationSink, QuestionRecord,
    QuestionStatus, SharedNotifier, TracingNotifier, ValidationOutcome,
};

// Re-export progression types
pub use progression::{
    progress_to_next, rank_for, BadgeDefinition, BadgeEvaluator, RankProgress, RankTier,
    BADGE_CATALOG, RANK_LADDER,
};

// Re-export auth types
pub use auth::{token_digest, AuthUser, Capability, Role};

// Re-export API types
pub use api::{
    build_app, create_forum_router, create_gems_router, create_profile_router, AuthState,
    ForumApiState, GemsApiState, ProfileApiState, RateLimitState,
};

// Re-export store types
pub use store::{
    ContentRecord, MemoryStore, PartnerOffer, ReportRecord, SharedStore, StorageBackend,
    UserRecord,
};
