//! Badge catalog and the opportunistic evaluator.
//!
//! Badges are evaluated against live aggregates whenever something
//! badge-relevant happens (an answer gets endorsed, content is created).
//! There is no scheduled sweep, so a user can sit past a threshold until
//! their next qualifying action. Awards are idempotent at the storage
//! layer and an evaluation never revokes anything.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{PalmaresError, Result};
use crate::store::SharedStore;

/// Threshold over a live aggregate. Adding a variant means adding one
/// measurement arm in `BadgeEvaluator::evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeCondition {
    EndorsedAnswers(i64),
    ContentCreated(i64),
    AccountAgeYears(i64),
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BadgeDefinition {
    pub slug: &'static str,
    pub label: &'static str,
    #[serde(skip)]
    pub condition: BadgeCondition,
}

pub const BADGE_CATALOG: [BadgeDefinition; 7] = [
    BadgeDefinition {
        slug: "entraide",
        label: "Entraide",
        condition: BadgeCondition::EndorsedAnswers(1),
    },
    BadgeDefinition {
        slug: "mentor",
        label: "Mentor",
        condition: BadgeCondition::EndorsedAnswers(10),
    },
    BadgeDefinition {
        slug: "pilier",
        label: "Pilier de la communauté",
        condition: BadgeCondition::EndorsedAnswers(50),
    },
    BadgeDefinition {
        slug: "createur",
        label: "Créateur",
        condition: BadgeCondition::ContentCreated(1),
    },
    BadgeDefinition {
        slug: "bibliothecaire",
        label: "Bibliothécaire",
        condition: BadgeCondition::ContentCreated(20),
    },
    BadgeDefinition {
        slug: "fidele",
        label: "Fidèle",
        condition: BadgeCondition::AccountAgeYears(1),
    },
    BadgeDefinition {
        slug: "veteran",
        label: "Vétéran",
        condition: BadgeCondition::AccountAgeYears(3),
    },
];

#[derive(Clone)]
pub struct BadgeEvaluator {
    store: SharedStore,
}

impl BadgeEvaluator {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Checks every catalog entry against current aggregates and awards
    /// whatever the user newly qualifies for. Returns the slugs awarded by
    /// this call; re-running immediately returns an empty list.
    pub async fn evaluate(&self, user_id: Uuid) -> Result<Vec<String>> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("user {} not found", user_id)))?;

        let endorsed = self.store.count_endorsed_answers(user_id).await?;
        let contents = self.store.count_content(user_id).await?;
        let age = Utc::now().signed_duration_since(user.created_at);

        let mut awarded = Vec::new();
        for definition in &BADGE_CATALOG {
            if user.badges.contains(definition.slug) {
                continue;
            }
            let met = match definition.condition {
                BadgeCondition::EndorsedAnswers(min) => endorsed >= min,
                BadgeCondition::ContentCreated(min) => contents >= min,
                BadgeCondition::AccountAgeYears(years) => age >= Duration::days(365 * years),
            };
            if !met {
                continue;
            }
            // Storage re-checks membership, so a concurrent evaluation of the
            // same user cannot double-award.
            if self.store.award_badge(user_id, definition.slug).await? {
                info!(user_id = %user_id, badge = definition.slug, "badge awarded");
                awarded.push(definition.slug.to_string());
            }
        }
        Ok(awarded)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::Role;
    use crate::forum::models::{AnswerRecord, AnswerStatus, QuestionRecord};
    use crate::store::memory::MemoryStore;
    use crate::store::records::{ContentRecord, UserRecord};

    async fn fresh_user(store: &SharedStore) -> Uuid {
        let user = UserRecord::new(Uuid::new_v4(), "mina", Role::Student);
        let user_id = user.id;
        store.insert_user(user).await.unwrap();
        user_id
    }

    async fn endorse_answers(store: &SharedStore, author_id: Uuid, count: usize) {
        let question = QuestionRecord::new(
            Uuid::new_v4(),
            "Équations".to_string(),
            "maths".to_string(),
            "3e".to_string(),
            5,
            Vec::new(),
        );
        let question_id = question.id;
        store.insert_question(question).await.unwrap();
        for _ in 0..count {
            let mut answer = AnswerRecord::new(
                question_id,
                author_id,
                "Voir le théorème".to_string(),
                Vec::new(),
            );
            answer.status = AnswerStatus::Validee;
            store.insert_answer(answer).await.unwrap();
        }
    }

    #[test]
    fn test_catalog_slugs_are_unique() {
        for (i, a) in BADGE_CATALOG.iter().enumerate() {
            for b in &BADGE_CATALOG[i + 1..] {
                assert_ne!(a.slug, b.slug);
            }
        }
    }

    #[tokio::test]
    async fn test_endorsed_threshold_awards_once() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let user_id = fresh_user(&store).await;
        endorse_answers(&store, user_id, 1).await;

        let evaluator = BadgeEvaluator::new(store.clone());
        let first = evaluator.evaluate(user_id).await.unwrap();
        assert_eq!(first, vec!["entraide".to_string()]);

        let second = evaluator.evaluate(user_id).await.unwrap();
        assert!(second.is_empty());

        let user = store.get_user(user_id).await.unwrap().unwrap();
        assert!(user.badges.contains("entraide"));
        assert!(!user.badges.contains("mentor"));
    }

    #[tokio::test]
    async fn test_multiple_thresholds_in_one_pass() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let user_id = fresh_user(&store).await;
        endorse_answers(&store, user_id, 10).await;
        store
            .insert_content(ContentRecord::new(user_id, "course"))
            .await
            .unwrap();

        let evaluator = BadgeEvaluator::new(store);
        let mut awarded = evaluator.evaluate(user_id).await.unwrap();
        awarded.sort();
        assert_eq!(awarded, vec!["createur", "entraide", "mentor"]);
    }

    #[tokio::test]
    async fn test_account_age_badges() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let mut user = UserRecord::new(Uuid::new_v4(), "ada", Role::Student);
        user.created_at = Utc::now() - Duration::days(400);
        let user_id = user.id;
        store.insert_user(user).await.unwrap();

        let evaluator = BadgeEvaluator::new(store);
        let awarded = evaluator.evaluate(user_id).await.unwrap();
        assert_eq!(awarded, vec!["fidele".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let evaluator = BadgeEvaluator::new(store);
        let err = evaluator.evaluate(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PalmaresError::NotFound(_)));
    }
}
