//! Rank Staircase and Progress Derivation
//!
//! Ranks are never persisted. Every read derives the tier from the user's
//! current point balance against a static ladder: three worlds (Bronze,
//! Argent, Or) of three tiers each, numbered III down to I inside a world.
//! Minimum points are strictly increasing with level, which keeps the
//! derivation monotonic.

use serde::Serialize;

/// One step of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankTier {
    pub name: &'static str,
    /// 1-based, increasing with prestige.
    pub level: u8,
    /// World grouping of three adjacent tiers.
    pub world: &'static str,
    /// Minimum cumulative points to hold this tier.
    pub min_points: i64,
}

/// The full ladder, lowest tier first. `min_points` strictly increasing.
pub const RANK_LADDER: [RankTier; 9] = [
    RankTier { name: "Bronze III", level: 1, world: "Bronze", min_points: 0 },
    RankTier { name: "Bronze II", level: 2, world: "Bronze", min_points: 30 },
    RankTier { name: "Bronze I", level: 3, world: "Bronze", min_points: 75 },
    RankTier { name: "Argent III", level: 4, world: "Argent", min_points: 150 },
    RankTier { name: "Argent II", level: 5, world: "Argent", min_points: 250 },
    RankTier { name: "Argent I", level: 6, world: "Argent", min_points: 400 },
    RankTier { name: "Or III", level: 7, world: "Or", min_points: 600 },
    RankTier { name: "Or II", level: 8, world: "Or", min_points: 850 },
    RankTier { name: "Or I", level: 9, world: "Or", min_points: 1200 },
];

/// Highest tier whose `min_points` does not exceed `points`. Negative
/// balances (deletion penalties) land on the lowest tier.
pub fn rank_for(points: i64) -> &'static RankTier {
    RANK_LADDER
        .iter()
        .rev()
        .find(|tier| tier.min_points <= points)
        .unwrap_or(&RANK_LADDER[0])
}

/// Position between the current tier and the next one.
#[derive(Debug, Clone, Serialize)]
pub struct RankProgress {
    pub current: &'static RankTier,
    pub next: Option<&'static RankTier>,
    /// 0..=100; pinned to 100 at the top tier.
    pub percent: u8,
    /// Points still missing to reach `next`; 0 at the top tier.
    pub points_needed: i64,
}

pub fn progress_to_next(points: i64) -> RankProgress {
    let current = rank_for(points);
    let next = RANK_LADDER.get(current.level as usize);

    match next {
        Some(next_tier) => {
            let span = next_tier.min_points - current.min_points;
            let gained = points - current.min_points;
            let percent = (100 * gained / span).clamp(0, 100) as u8;
            RankProgress {
                current,
                next: Some(next_tier),
                percent,
                points_needed: next_tier.min_points - points,
            }
        }
        None => RankProgress { current, next: None, percent: 100, points_needed: 0 },
    }
}
