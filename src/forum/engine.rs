//! Forum arbitration: question lifecycle, answer endorsement, payouts.
//!
//! State machine:
//! questions go `non_validee -> validee -> resolue` and `resolue` is
//! terminal; answers go `proposee -> validee` (staff) or
//! `proposee|validee -> meilleure_reponse` (owner selection). A question
//! holds at most one best answer, enforced by the conditional resolve
//! write rather than by a lock: whoever flips the status first wins, every
//! later attempt sees `Conflict`.
//!
//! The stake is escrowed when the question is created and paid exactly
//! once, by owner selection. Staff endorsement certifies quality but moves
//! no points.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Capability, Role};
use crate::config::EconomySettings;
use crate::error::{PalmaresError, Result};
use crate::ledger::gems::{GemLedger, GemTransactionKind};
use crate::ledger::points::{PointAction, PointLedger, PointRefs};
use crate::progression::BadgeEvaluator;
use crate::store::SharedStore;

use super::models::{AnswerRecord, AnswerStatus, QuestionRecord, QuestionStatus};
use super::notify::{Notification, SharedNotifier};

/// What a validation call did, in wire-ready form.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Owner selection: question resolved, stake paid out.
    BestAnswer {
        question_id: Uuid,
        answer_id: Uuid,
        points_awarded: i64,
        gems_awarded: i64,
    },
    /// Staff endorsement: quality certified, nothing paid.
    Endorsed {
        question_id: Uuid,
        answer_id: Uuid,
    },
}

#[derive(Clone)]
pub struct ArbitrationEngine {
    store: SharedStore,
    points: PointLedger,
    gems: GemLedger,
    badges: BadgeEvaluator,
    notifier: SharedNotifier,
    settings: EconomySettings,
}

impl ArbitrationEngine {
    pub fn new(store: SharedStore, notifier: SharedNotifier, settings: EconomySettings) -> Self {
        Self {
            points: PointLedger::new(store.clone()),
            gems: GemLedger::new(store.clone()),
            badges: BadgeEvaluator::new(store.clone()),
            store,
            notifier,
            settings,
        }
    }

    /// Opens a question with a point stake. The stake is debited up front;
    /// it comes back to whoever the owner later picks as best answer.
    pub async fn create_question(
        &self,
        author_id: Uuid,
        title: String,
        subject: String,
        class_level: String,
        stake: i64,
        attachments: Vec<String>,
    ) -> Result<QuestionRecord> {
        if title.trim().is_empty() {
            return Err(PalmaresError::Validation("title cannot be empty".to_string()));
        }
        if subject.trim().is_empty() {
            return Err(PalmaresError::Validation("subject cannot be empty".to_string()));
        }
        if stake < self.settings.min_stake || stake > self.settings.max_stake {
            return Err(PalmaresError::Validation(format!(
                "stake must be between {} and {}",
                self.settings.min_stake, self.settings.max_stake
            )));
        }

        // The ledger itself never refuses a debit; affordability is this
        // module's rule. Checked by read, so the balance can still dip
        // below zero through later compensations.
        let balance = self.points.balance(author_id).await?;
        if balance < stake {
            return Err(PalmaresError::Validation(format!(
                "stake {} exceeds current points balance {}",
                stake, balance
            )));
        }

        let question = QuestionRecord::new(author_id, title, subject, class_level, stake, attachments);
        self.points
            .record(
                author_id,
                PointAction::CreateQuestion,
                -stake,
                PointRefs::question(question.id),
            )
            .await?;
        self.store.insert_question(question.clone()).await?;

        info!(
            question_id = %question.id,
            author_id = %author_id,
            stake,
            "question created"
        );
        Ok(question)
    }

    pub async fn question_with_answers(
        &self,
        question_id: Uuid,
    ) -> Result<(QuestionRecord, Vec<AnswerRecord>)> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("question {} not found", question_id)))?;
        let answers = self.store.answers_for_question(question_id).await?;
        Ok((question, answers))
    }

    /// Adds an answer. Answering someone else's question earns the flat
    /// participation reward; answering your own earns nothing.
    pub async fn submit_answer(
        &self,
        question_id: Uuid,
        author_id: Uuid,
        content: String,
        attachments: Vec<String>,
    ) -> Result<AnswerRecord> {
        if content.trim().is_empty() {
            return Err(PalmaresError::Validation("answer content cannot be empty".to_string()));
        }

        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("question {} not found", question_id)))?;
        if question.status.is_terminal() {
            return Err(PalmaresError::Conflict("question is already resolved".to_string()));
        }
        self.store
            .get_user(author_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("user {} not found", author_id)))?;

        let answer = AnswerRecord::new(question_id, author_id, content, attachments);
        self.store.insert_answer(answer.clone()).await?;

        if author_id != question.author_id {
            self.points
                .record(
                    author_id,
                    PointAction::CreateAnswer,
                    self.settings.answer_reward_points,
                    PointRefs::answer(question_id, answer.id),
                )
                .await?;
            self.notifier.dispatch(&Notification::AnswerReceived {
                recipient: question.author_id,
                question_id,
                answer_id: answer.id,
            });
        }

        if let Err(e) = self.badges.evaluate(author_id).await {
            warn!(user_id = %author_id, error = %e, "badge evaluation failed after answer");
        }

        info!(
            question_id = %question_id,
            answer_id = %answer.id,
            author_id = %author_id,
            "answer submitted"
        );
        Ok(answer)
    }

    /// Validates an answer. The question owner selects the best answer and
    /// triggers the payout; staff with the right capability endorse quality
    /// without paying anything.
    pub async fn validate_answer(
        &self,
        answer_id: Uuid,
        actor_id: Uuid,
        actor_role: Role,
    ) -> Result<ValidationOutcome> {
        let answer = self
            .store
            .get_answer(answer_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("answer {} not found", answer_id)))?;
        let question = self
            .store
            .get_question(answer.question_id)
            .await?
            .ok_or_else(|| {
                PalmaresError::NotFound(format!("question {} not found", answer.question_id))
            })?;

        if actor_id == question.author_id {
            self.select_best_answer(question, answer, actor_id).await
        } else {
            self.endorse_answer(question, answer, actor_id, actor_role).await
        }
    }

    async fn select_best_answer(
        &self,
        question: QuestionRecord,
        answer: AnswerRecord,
        actor_id: Uuid,
    ) -> Result<ValidationOutcome> {
        // The resolve write is the winner gate and must come first: two
        // racing selections both reaching the answer update would leave two
        // best answers behind.
        if !self.store.try_resolve_question(question.id).await? {
            return Err(PalmaresError::Conflict("question is already resolved".to_string()));
        }
        self.store
            .set_answer_status(answer.id, AnswerStatus::MeilleureReponse)
            .await?;

        self.points
            .record(
                answer.author_id,
                PointAction::ValidateAnswer,
                question.stake,
                PointRefs::answer(question.id, answer.id),
            )
            .await?;

        let mut gems_awarded = 0;
        if self.settings.best_answer_gem_bonus > 0 {
            self.gems
                .credit(
                    answer.author_id,
                    self.settings.best_answer_gem_bonus,
                    GemTransactionKind::Reward,
                    "Bonus meilleure réponse",
                    serde_json::json!({ "question_id": question.id }),
                )
                .await?;
            gems_awarded = self.settings.best_answer_gem_bonus;
        }

        if let Err(e) = self.badges.evaluate(answer.author_id).await {
            warn!(user_id = %answer.author_id, error = %e, "badge evaluation failed after selection");
        }

        if answer.author_id != actor_id {
            self.notifier.dispatch(&Notification::BestAnswerChosen {
                recipient: answer.author_id,
                question_id: question.id,
                answer_id: answer.id,
                points: question.stake,
            });
        }

        info!(
            question_id = %question.id,
            answer_id = %answer.id,
            winner = %answer.author_id,
            stake = question.stake,
            "best answer selected"
        );
        Ok(ValidationOutcome::BestAnswer {
            question_id: question.id,
            answer_id: answer.id,
            points_awarded: question.stake,
            gems_awarded,
        })
    }

    async fn endorse_answer(
        &self,
        question: QuestionRecord,
        answer: AnswerRecord,
        actor_id: Uuid,
        actor_role: Role,
    ) -> Result<ValidationOutcome> {
        if !actor_role.allows(Capability::ValidateAnswers) {
            return Err(PalmaresError::Forbidden(format!(
                "role {} cannot validate answers",
                actor_role.as_str()
            )));
        }
        if answer.status != AnswerStatus::Proposee {
            return Err(PalmaresError::Conflict("answer is already validated".to_string()));
        }

        self.store
            .set_answer_status(answer.id, AnswerStatus::Validee)
            .await?;
        if question.status == QuestionStatus::NonValidee {
            self.store
                .set_question_status(question.id, QuestionStatus::Validee)
                .await?;
        }

        if let Err(e) = self.badges.evaluate(answer.author_id).await {
            warn!(user_id = %answer.author_id, error = %e, "badge evaluation failed after endorsement");
        }

        if answer.author_id != actor_id {
            self.notifier.dispatch(&Notification::AnswerEndorsed {
                recipient: answer.author_id,
                question_id: question.id,
                answer_id: answer.id,
            });
        }

        info!(
            question_id = %question.id,
            answer_id = %answer.id,
            validator = %actor_id,
            "answer endorsed by staff"
        );
        Ok(ValidationOutcome::Endorsed {
            question_id: question.id,
            answer_id: answer.id,
        })
    }

    pub async fn like_answer(&self, answer_id: Uuid, actor_id: Uuid) -> Result<i64> {
        let answer = self
            .store
            .get_answer(answer_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("answer {} not found", answer_id)))?;
        if answer.author_id == actor_id {
            return Err(PalmaresError::Validation("cannot like your own answer".to_string()));
        }
        self.store.increment_answer_likes(answer_id).await
    }

    /// Removes an answer. Moderators need an active report on the answer;
    /// admins may delete without one. Deleting a best answer claws the
    /// stake back from its author, which can push their balance negative.
    /// The question stays resolved.
    pub async fn delete_answer(
        &self,
        answer_id: Uuid,
        actor_id: Uuid,
        actor_role: Role,
    ) -> Result<()> {
        let answer = self
            .store
            .get_answer(answer_id)
            .await?
            .ok_or_else(|| PalmaresError::NotFound(format!("answer {} not found", answer_id)))?;

        if !actor_role.allows(Capability::DeleteAnswers) {
            return Err(PalmaresError::Forbidden(format!(
                "role {} cannot delete answers",
                actor_role.as_str()
            )));
        }
        if !actor_role.allows(Capability::BypassReportGate)
            && !self.store.has_active_report(answer_id).await?
        {
            return Err(PalmaresError::Forbidden(
                "answer has no active report".to_string(),
            ));
        }

        if answer.status == AnswerStatus::MeilleureReponse {
            let question = self
                .store
                .get_question(answer.question_id)
                .await?
                .ok_or_else(|| {
                    PalmaresError::NotFound(format!("question {} not found", answer.question_id))
                })?;
            self.points
                .record(
                    answer.author_id,
                    PointAction::DeleteAnswer,
                    -question.stake,
                    PointRefs::answer(question.id, answer.id),
                )
                .await?;
        }

        self.store.delete_answer(answer_id).await?;
        info!(
            answer_id = %answer_id,
            moderator = %actor_id,
            was_best = answer.status == AnswerStatus::MeilleureReponse,
            "answer deleted"
        );
        Ok(())
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn point_ledger(&self) -> &PointLedger {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::forum::notify::NotificationSink;
    use crate::store::memory::MemoryStore;
    use crate::store::records::{ReportRecord, UserRecord};

    struct RecordingNotifier {
        events: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self { events: Mutex::new(Vec::new()) })
        }

        fn events(&self) -> Vec<Notification> {
            self.events.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingNotifier {
        fn dispatch(&self, notification: &Notification) {
            self.events.lock().unwrap().push(notification.clone());
        }
    }

    struct Fixture {
        engine: ArbitrationEngine,
        store: SharedStore,
        notifier: Arc<RecordingNotifier>,
        owner: Uuid,
        helper: Uuid,
        teacher: Uuid,
        moderator: Uuid,
        admin: Uuid,
    }

    async fn fixture() -> Fixture {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let notifier = RecordingNotifier::new();
        let engine = ArbitrationEngine::new(
            store.clone(),
            notifier.clone(),
            EconomySettings::default(),
        );

        let mut ids = Vec::new();
        for (name, role, points) in [
            ("lea", Role::Student, 100),
            ("noe", Role::Student, 40),
            ("mina", Role::Teacher, 800),
            ("marius", Role::Moderator, 300),
            ("ada", Role::Admin, 1500),
        ] {
            let user = UserRecord::new(Uuid::new_v4(), name, role);
            let id = user.id;
            store.insert_user(user).await.unwrap();
            store.adjust_points(id, points).await.unwrap();
            ids.push(id);
        }

        Fixture {
            engine,
            store,
            notifier,
            owner: ids[0],
            helper: ids[1],
            teacher: ids[2],
            moderator: ids[3],
            admin: ids[4],
        }
    }

    async fn open_question(fx: &Fixture, stake: i64) -> QuestionRecord {
        fx.engine
            .create_question(
                fx.owner,
                "Comment résoudre x² = 4 ?".to_string(),
                "maths".to_string(),
                "3e".to_string(),
                stake,
                Vec::new(),
            )
            .await
            .unwrap()
    }

    async fn points_of(fx: &Fixture, user_id: Uuid) -> i64 {
        fx.store.get_user(user_id).await.unwrap().unwrap().points
    }

    #[tokio::test]
    async fn test_create_question_escrows_stake() {
        let fx = fixture().await;
        let question = open_question(&fx, 10).await;

        assert_eq!(question.status, QuestionStatus::NonValidee);
        assert_eq!(points_of(&fx, fx.owner).await, 90);

        let history = fx.store.point_history(fx.owner).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, PointAction::CreateQuestion);
        assert_eq!(history[0].points, -10);
        assert_eq!(history[0].question_id, Some(question.id));
    }

    #[tokio::test]
    async fn test_create_question_rejects_bad_stakes() {
        let fx = fixture().await;
        for stake in [0, 16, -3] {
            let err = fx
                .engine
                .create_question(
                    fx.owner,
                    "Titre".to_string(),
                    "maths".to_string(),
                    "3e".to_string(),
                    stake,
                    Vec::new(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, PalmaresError::Validation(_)), "stake {}", stake);
        }
        assert_eq!(points_of(&fx, fx.owner).await, 100);
    }

    #[tokio::test]
    async fn test_create_question_requires_affordable_stake() {
        let fx = fixture().await;
        fx.store.adjust_points(fx.owner, -95).await.unwrap();

        let err = fx
            .engine
            .create_question(
                fx.owner,
                "Titre".to_string(),
                "maths".to_string(),
                "3e".to_string(),
                10,
                Vec::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::Validation(_)));
        assert_eq!(points_of(&fx, fx.owner).await, 5);
    }

    #[tokio::test]
    async fn test_submit_answer_rewards_helper_not_owner() {
        let fx = fixture().await;
        let question = open_question(&fx, 10).await;

        fx.engine
            .submit_answer(question.id, fx.helper, "x = ±2".to_string(), Vec::new())
            .await
            .unwrap();
        assert_eq!(points_of(&fx, fx.helper).await, 42);

        fx.engine
            .submit_answer(question.id, fx.owner, "Je précise ma question".to_string(), Vec::new())
            .await
            .unwrap();
        assert_eq!(points_of(&fx, fx.owner).await, 90);

        let events = fx.notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].recipient(), fx.owner);
    }

    #[tokio::test]
    async fn test_owner_selection_pays_stake_once() {
        let fx = fixture().await;
        let question = open_question(&fx, 10).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "x = ±2".to_string(), Vec::new())
            .await
            .unwrap();

        let outcome = fx
            .engine
            .validate_answer(answer.id, fx.owner, Role::Student)
            .await
            .unwrap();
        match outcome {
            ValidationOutcome::BestAnswer { points_awarded, gems_awarded, .. } => {
                assert_eq!(points_awarded, 10);
                assert_eq!(gems_awarded, 1);
            }
            other => panic!("expected best answer outcome, got {:?}", other),
        }

        // 40 starting + 2 answer reward + 10 stake
        assert_eq!(points_of(&fx, fx.helper).await, 52);
        let gems = fx.store.gem_account(fx.helper).await.unwrap();
        assert_eq!(gems.balance, 1);

        let question = fx.store.get_question(question.id).await.unwrap().unwrap();
        assert_eq!(question.status, QuestionStatus::Resolue);
        let answer = fx.store.get_answer(answer.id).await.unwrap().unwrap();
        assert_eq!(answer.status, AnswerStatus::MeilleureReponse);

        // Second selection hits the terminal state.
        let err = fx
            .engine
            .validate_answer(answer.id, fx.owner, Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::Conflict(_)));
        assert_eq!(points_of(&fx, fx.helper).await, 52);
    }

    #[tokio::test]
    async fn test_staff_endorsement_pays_nothing() {
        let fx = fixture().await;
        let question = open_question(&fx, 10).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "x = ±2".to_string(), Vec::new())
            .await
            .unwrap();
        let before = points_of(&fx, fx.helper).await;

        let outcome = fx
            .engine
            .validate_answer(answer.id, fx.teacher, Role::Teacher)
            .await
            .unwrap();
        assert!(matches!(outcome, ValidationOutcome::Endorsed { .. }));

        assert_eq!(points_of(&fx, fx.helper).await, before);
        let answer = fx.store.get_answer(answer.id).await.unwrap().unwrap();
        assert_eq!(answer.status, AnswerStatus::Validee);
        let question = fx.store.get_question(question.id).await.unwrap().unwrap();
        assert_eq!(question.status, QuestionStatus::Validee);

        // Owner can still promote the endorsed answer afterwards.
        let outcome = fx
            .engine
            .validate_answer(answer.id, fx.owner, Role::Student)
            .await
            .unwrap();
        assert!(matches!(outcome, ValidationOutcome::BestAnswer { .. }));
    }

    #[tokio::test]
    async fn test_student_cannot_staff_validate() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Essai".to_string(), Vec::new())
            .await
            .unwrap();

        // A third student is neither the owner nor staff.
        let stranger = UserRecord::new(Uuid::new_v4(), "zoe", Role::Student);
        let stranger_id = stranger.id;
        fx.store.insert_user(stranger).await.unwrap();

        let err = fx
            .engine
            .validate_answer(answer.id, stranger_id, Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_double_staff_endorsement_conflicts() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Essai".to_string(), Vec::new())
            .await
            .unwrap();

        fx.engine
            .validate_answer(answer.id, fx.teacher, Role::Teacher)
            .await
            .unwrap();
        let err = fx
            .engine
            .validate_answer(answer.id, fx.teacher, Role::Teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_answer_on_resolved_question_conflicts() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Essai".to_string(), Vec::new())
            .await
            .unwrap();
        fx.engine
            .validate_answer(answer.id, fx.owner, Role::Student)
            .await
            .unwrap();

        let err = fx
            .engine
            .submit_answer(question.id, fx.teacher, "Trop tard".to_string(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_moderator_delete_requires_active_report() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Contenu signalé".to_string(), Vec::new())
            .await
            .unwrap();

        let err = fx
            .engine
            .delete_answer(answer.id, fx.moderator, Role::Moderator)
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::Forbidden(_)));
        assert!(fx.store.get_answer(answer.id).await.unwrap().is_some());

        fx.store
            .insert_report(ReportRecord::active_for(answer.id))
            .await
            .unwrap();
        fx.engine
            .delete_answer(answer.id, fx.moderator, Role::Moderator)
            .await
            .unwrap();
        assert!(fx.store.get_answer(answer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_deletes_without_report() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Hors sujet".to_string(), Vec::new())
            .await
            .unwrap();

        fx.engine
            .delete_answer(answer.id, fx.admin, Role::Admin)
            .await
            .unwrap();
        assert!(fx.store.get_answer(answer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_student_cannot_delete() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Essai".to_string(), Vec::new())
            .await
            .unwrap();

        let err = fx
            .engine
            .delete_answer(answer.id, fx.helper, Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, PalmaresError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_deleting_best_answer_claws_back_stake() {
        let fx = fixture().await;
        let question = open_question(&fx, 7).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Gagnant".to_string(), Vec::new())
            .await
            .unwrap();
        fx.engine
            .validate_answer(answer.id, fx.owner, Role::Student)
            .await
            .unwrap();
        let before = points_of(&fx, fx.helper).await;

        fx.store
            .insert_report(ReportRecord::active_for(answer.id))
            .await
            .unwrap();
        fx.engine
            .delete_answer(answer.id, fx.moderator, Role::Moderator)
            .await
            .unwrap();

        assert_eq!(points_of(&fx, fx.helper).await, before - 7);
        let history = fx.store.point_history(fx.helper).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.action, PointAction::DeleteAnswer);
        assert_eq!(last.points, -7);

        // The question does not reopen.
        let question = fx.store.get_question(question.id).await.unwrap().unwrap();
        assert_eq!(question.status, QuestionStatus::Resolue);
    }

    #[tokio::test]
    async fn test_clawback_can_push_balance_negative() {
        let fx = fixture().await;
        let question = open_question(&fx, 7).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Gagnant".to_string(), Vec::new())
            .await
            .unwrap();
        fx.engine
            .validate_answer(answer.id, fx.owner, Role::Student)
            .await
            .unwrap();

        // Drain the helper before the clawback lands.
        let current = points_of(&fx, fx.helper).await;
        fx.store.adjust_points(fx.helper, -current).await.unwrap();

        fx.engine
            .delete_answer(answer.id, fx.admin, Role::Admin)
            .await
            .unwrap();
        assert_eq!(points_of(&fx, fx.helper).await, -7);
    }

    #[tokio::test]
    async fn test_like_answer() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Bien vu".to_string(), Vec::new())
            .await
            .unwrap();

        assert_eq!(fx.engine.like_answer(answer.id, fx.owner).await.unwrap(), 1);
        assert_eq!(fx.engine.like_answer(answer.id, fx.teacher).await.unwrap(), 2);

        let err = fx.engine.like_answer(answer.id, fx.helper).await.unwrap_err();
        assert!(matches!(err, PalmaresError::Validation(_)));
    }

    #[tokio::test]
    async fn test_best_answer_awards_entraide_badge() {
        let fx = fixture().await;
        let question = open_question(&fx, 5).await;
        let answer = fx
            .engine
            .submit_answer(question.id, fx.helper, "Bonne réponse".to_string(), Vec::new())
            .await
            .unwrap();
        fx.engine
            .validate_answer(answer.id, fx.owner, Role::Student)
            .await
            .unwrap();

        let helper = fx.store.get_user(fx.helper).await.unwrap().unwrap();
        assert!(helper.badges.contains("entraide"));
    }
}
