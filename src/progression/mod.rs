//! Ranks and badges derived from the point counter and activity aggregates.

pub mod badges;
pub mod rank;

pub use badges::{BadgeCondition, BadgeDefinition, BadgeEvaluator, BADGE_CATALOG};
pub use rank::{progress_to_next, rank_for, RankProgress, RankTier, RANK_LADDER};
