//! In-memory backend for development and tests.
//!
//! All collections live behind a single `RwLock`, so every compound
//! check-and-mutate (conditional gem debit, conditional resolve) holds the
//! write guard for its whole critical section. That makes the memory
//! backend's atomicity guarantees identical to the single-statement SQL the
//! Postgres backend uses.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PalmaresError, Result};
use crate::forum::models::{AnswerRecord, AnswerStatus, QuestionRecord, QuestionStatus};
use crate::ledger::gems::{DebitOutcome, GemAccount, GemTransaction};
use crate::ledger::points::PointTransaction;

use super::records::{ContentRecord, PartnerOffer, ReportRecord, ReportStatus, UserRecord};
use super::StorageBackend;

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserRecord>,
    sessions: HashMap<String, Uuid>,
    questions: HashMap<Uuid, QuestionRecord>,
    answers: HashMap<Uuid, AnswerRecord>,
    point_log: Vec<PointTransaction>,
    gem_accounts: HashMap<Uuid, GemAccount>,
    gem_log: Vec<GemTransaction>,
    reports: Vec<ReportRecord>,
    contents: Vec<ContentRecord>,
    partner_offers: HashMap<Uuid, PartnerOffer>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn user_not_found(user_id: Uuid) -> PalmaresError {
    PalmaresError::NotFound(format!("user {} not found", user_id))
}

fn answer_not_found(answer_id: Uuid) -> PalmaresError {
    PalmaresError::NotFound(format!("answer {} not found", answer_id))
}

#[async_trait]
impl StorageBackend for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert_user(&self, user: UserRecord) -> Result<()> {
        let mut state = self.inner.write().await;
        state.users.entry(user.id).or_insert(user);
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>> {
        let state = self.inner.read().await;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn adjust_points(&self, user_id: Uuid, delta: i64) -> Result<i64> {
        let mut state = self.inner.write().await;
        let user = state.users.get_mut(&user_id).ok_or_else(|| user_not_found(user_id))?;
        user.points += delta;
        Ok(user.points)
    }

    async fn award_badge(&self, user_id: Uuid, slug: &str) -> Result<bool> {
        let mut state = self.inner.write().await;
        let user = state.users.get_mut(&user_id).ok_or_else(|| user_not_found(user_id))?;
        Ok(user.badges.insert(slug.to_string()))
    }

    async fn unlock_customization(&self, user_id: Uuid, slug: &str) -> Result<bool> {
        let mut state = self.inner.write().await;
        let user = state.users.get_mut(&user_id).ok_or_else(|| user_not_found(user_id))?;
        Ok(user.customizations.insert(slug.to_string()))
    }

    async fn insert_session(&self, token_digest: &str, user_id: Uuid) -> Result<()> {
        let mut state = self.inner.write().await;
        state.sessions.insert(token_digest.to_string(), user_id);
        Ok(())
    }

    async fn resolve_session(&self, token_digest: &str) -> Result<Option<Uuid>> {
        let state = self.inner.read().await;
        Ok(state.sessions.get(token_digest).copied())
    }

    async fn append_point_transaction(&self, transaction: PointTransaction) -> Result<()> {
        let mut state = self.inner.write().await;
        state.point_log.push(transaction);
        Ok(())
    }

    async fn point_history(&self, user_id: Uuid) -> Result<Vec<PointTransaction>> {
        let state = self.inner.read().await;
        Ok(state
            .point_log
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn gem_account(&self, user_id: Uuid) -> Result<GemAccount> {
        let state = self.inner.read().await;
        Ok(state
            .gem_accounts
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| GemAccount::empty(user_id)))
    }

    async fn credit_gems(&self, user_id: Uuid, amount: i64) -> Result<i64> {
        let mut state = self.inner.write().await;
        let account = state
            .gem_accounts
            .entry(user_id)
            .or_insert_with(|| GemAccount::empty(user_id));
        account.balance += amount;
        account.total_earned += amount;
        Ok(account.balance)
    }

    async fn try_debit_gems(&self, user_id: Uuid, amount: i64) -> Result<DebitOutcome> {
        // Check and debit under one write guard; this is the no-double-spend
        // guarantee.
        let mut state = self.inner.write().await;
        let account = state
            .gem_accounts
            .entry(user_id)
            .or_insert_with(|| GemAccount::empty(user_id));
        if account.balance < amount {
            return Ok(DebitOutcome::Insufficient { current: account.balance });
        }
        account.balance -= amount;
        account.total_spent += amount;
        Ok(DebitOutcome::Applied { new_balance: account.balance })
    }

    async fn append_gem_transaction(&self, transaction: GemTransaction) -> Result<()> {
        let mut state = self.inner.write().await;
        state.gem_log.push(transaction);
        Ok(())
    }

    async fn gem_history(&self, user_id: Uuid) -> Result<Vec<GemTransaction>> {
        let state = self.inner.read().await;
        Ok(state
            .gem_log
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_question(&self, question: QuestionRecord) -> Result<()> {
        let mut state = self.inner.write().await;
        state.questions.insert(question.id, question);
        Ok(())
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<QuestionRecord>> {
        let state = self.inner.read().await;
        Ok(state.questions.get(&question_id).cloned())
    }

    async fn set_question_status(&self, question_id: Uuid, status: QuestionStatus) -> Result<()> {
        let mut state = self.inner.write().await;
        let question = state
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| PalmaresError::NotFound(format!("question {} not found", question_id)))?;
        question.status = status;
        Ok(())
    }

    async fn try_resolve_question(&self, question_id: Uuid) -> Result<bool> {
        let mut state = self.inner.write().await;
        let question = state
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| PalmaresError::NotFound(format!("question {} not found", question_id)))?;
        if question.status == QuestionStatus::Resolue {
            return Ok(false);
        }
        question.status = QuestionStatus::Resolue;
        Ok(true)
    }

    async fn insert_answer(&self, answer: AnswerRecord) -> Result<()> {
        let mut state = self.inner.write().await;
        state.answers.insert(answer.id, answer);
        Ok(())
    }

    async fn get_answer(&self, answer_id: Uuid) -> Result<Option<AnswerRecord>> {
        let state = self.inner.read().await;
        Ok(state.answers.get(&answer_id).cloned())
    }

    async fn answers_for_question(&self, question_id: Uuid) -> Result<Vec<AnswerRecord>> {
        let state = self.inner.read().await;
        let mut answers: Vec<AnswerRecord> = state
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect();
        answers.sort_by_key(|a| a.created_at);
        Ok(answers)
    }

    async fn set_answer_status(&self, answer_id: Uuid, status: AnswerStatus) -> Result<()> {
        let mut state = self.inner.write().await;
        let answer = state
            .answers
            .get_mut(&answer_id)
            .ok_or_else(|| answer_not_found(answer_id))?;
        answer.status = status;
        Ok(())
    }

    async fn increment_answer_likes(&self, answer_id: Uuid) -> Result<i64> {
        let mut state = self.inner.write().await;
        let answer = state
            .answers
            .get_mut(&answer_id)
            .ok_or_else(|| answer_not_found(answer_id))?;
        answer.likes += 1;
        Ok(answer.likes)
    }

    async fn delete_answer(&self, answer_id: Uuid) -> Result<()> {
        let mut state = self.inner.write().await;
        state
            .answers
            .remove(&answer_id)
            .map(|_| ())
            .ok_or_else(|| answer_not_found(answer_id))
    }

    async fn count_endorsed_answers(&self, author_id: Uuid) -> Result<i64> {
        let state = self.inner.read().await;
        Ok(state
            .answers
            .values()
            .filter(|a| a.author_id == author_id && a.status.is_endorsed())
            .count() as i64)
    }

    async fn insert_report(&self, report: ReportRecord) -> Result<()> {
        let mut state = self.inner.write().await;
        state.reports.push(report);
        Ok(())
    }

    async fn has_active_report(&self, answer_id: Uuid) -> Result<bool> {
        let state = self.inner.read().await;
        Ok(state
            .reports
            .iter()
            .any(|r| r.answer_id == answer_id && r.status == ReportStatus::Active))
    }

    async fn insert_content(&self, content: ContentRecord) -> Result<()> {
        let mut state = self.inner.write().await;
        state.contents.push(content);
        Ok(())
    }

    async fn count_content(&self, author_id: Uuid) -> Result<i64> {
        let state = self.inner.read().await;
        Ok(state.contents.iter().filter(|c| c.author_id == author_id).count() as i64)
    }

    async fn insert_partner_offer(&self, offer: PartnerOffer) -> Result<()> {
        let mut state = self.inner.write().await;
        state.partner_offers.entry(offer.id).or_insert(offer);
        Ok(())
    }

    async fn get_partner_offer(&self, offer_id: Uuid) -> Result<Option<PartnerOffer>> {
        let state = self.inner.read().await;
        Ok(state.partner_offers.get(&offer_id).cloned())
    }
}
