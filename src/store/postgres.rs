//! Postgres backend using sqlx.
//!
//! Every balance-critical operation is a single SQL statement so the
//! database provides the atomicity the contract asks for: the points
//! counter moves with `SET points = points + $n`, the gem debit is guarded
//! by `WHERE balance >= $n`, and the resolve transition by
//! `WHERE status <> 'resolue'`. No multi-statement transactions are opened;
//! the (log, counter) pair stays deliberately unpaired.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use async_trait::async_trait;

use crate::auth::Role;
use crate::error::{PalmaresError, Result};
use crate::forum::models::{AnswerRecord, AnswerStatus, QuestionRecord, QuestionStatus};
use crate::ledger::gems::{
    DebitOutcome, GemAccount, GemTransaction, GemTransactionKind, GemTransactionStatus,
};
use crate::ledger::points::{PointAction, PointTransaction, PointTransactionKind};

use super::records::{ContentRecord, PartnerOffer, ReportRecord, UserRecord};
use super::StorageBackend;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS economy",
    r#"
    CREATE TABLE IF NOT EXISTS economy.users (
        id UUID PRIMARY KEY,
        display_name TEXT NOT NULL,
        role TEXT NOT NULL,
        points BIGINT NOT NULL DEFAULT 0,
        badges TEXT[] NOT NULL DEFAULT '{}',
        customizations TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.sessions (
        token_digest TEXT PRIMARY KEY,
        user_id UUID NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.point_transactions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        action TEXT NOT NULL,
        kind TEXT NOT NULL,
        points BIGINT NOT NULL,
        question_id UUID,
        answer_id UUID,
        content_id UUID,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.gem_accounts (
        user_id UUID PRIMARY KEY,
        balance BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
        total_earned BIGINT NOT NULL DEFAULT 0,
        total_spent BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.gem_transactions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        kind TEXT NOT NULL,
        gems BIGINT NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL,
        metadata JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.questions (
        id UUID PRIMARY KEY,
        author_id UUID NOT NULL,
        title TEXT NOT NULL,
        subject TEXT NOT NULL,
        class_level TEXT NOT NULL,
        stake BIGINT NOT NULL,
        status TEXT NOT NULL,
        attachments TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.answers (
        id UUID PRIMARY KEY,
        question_id UUID NOT NULL,
        author_id UUID NOT NULL,
        content TEXT NOT NULL,
        status TEXT NOT NULL,
        likes BIGINT NOT NULL DEFAULT 0,
        attachments TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.reports (
        id UUID PRIMARY KEY,
        answer_id UUID NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.contents (
        id UUID PRIMARY KEY,
        author_id UUID NOT NULL,
        kind TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS economy.partner_offers (
        id UUID PRIMARY KEY,
        partner TEXT NOT NULL,
        title TEXT NOT NULL,
        gem_cost BIGINT NOT NULL,
        active BOOLEAN NOT NULL
    )
    "#,
];

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| PalmaresError::storage(format!("Failed to connect to Postgres: {}", e)))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| PalmaresError::storage(format!("Failed to init schema: {}", e)))?;
        }
        Ok(())
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM economy.users WHERE id = $1) AS present")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PalmaresError::storage(format!("Failed to check user: {}", e)))?;
        Ok(row.get("present"))
    }
}

fn map_user(row: &PgRow) -> Result<UserRecord> {
    let role_text: String = row.get("role");
    let role = Role::from_str_opt(&role_text)
        .ok_or_else(|| PalmaresError::storage(format!("invalid role in users row: {}", role_text)))?;
    let badges: Vec<String> = row.get("badges");
    let customizations: Vec<String> = row.get("customizations");
    Ok(UserRecord {
        id: row.get("id"),
        display_name: row.get("display_name"),
        role,
        points: row.get("points"),
        badges: badges.into_iter().collect(),
        customizations: customizations.into_iter().collect(),
        created_at: row.get("created_at"),
    })
}

fn map_point_transaction(row: &PgRow) -> Result<PointTransaction> {
    let action_text: String = row.get("action");
    let action = PointAction::from_str_opt(&action_text).ok_or_else(|| {
        PalmaresError::storage(format!("invalid action in point_transactions row: {}", action_text))
    })?;
    let kind_text: String = row.get("kind");
    let kind = PointTransactionKind::from_str_opt(&kind_text).ok_or_else(|| {
        PalmaresError::storage(format!("invalid kind in point_transactions row: {}", kind_text))
    })?;
    Ok(PointTransaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        action,
        kind,
        points: row.get("points"),
        question_id: row.get("question_id"),
        answer_id: row.get("answer_id"),
        content_id: row.get("content_id"),
        created_at: row.get("created_at"),
    })
}

fn map_gem_transaction(row: &PgRow) -> Result<GemTransaction> {
    let kind_text: String = row.get("kind");
    let kind = GemTransactionKind::from_str_opt(&kind_text).ok_or_else(|| {
        PalmaresError::storage(format!("invalid kind in gem_transactions row: {}", kind_text))
    })?;
    let status_text: String = row.get("status");
    let status = GemTransactionStatus::from_str_opt(&status_text).ok_or_else(|| {
        PalmaresError::storage(format!("invalid status in gem_transactions row: {}", status_text))
    })?;
    Ok(GemTransaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        gems: row.get("gems"),
        description: row.get("description"),
        status,
        metadata: row.get("metadata"),
        created_at: row.get("created_at"),
    })
}

fn map_question(row: &PgRow) -> Result<QuestionRecord> {
    let status_text: String = row.get("status");
    let status = QuestionStatus::from_str_opt(&status_text).ok_or_else(|| {
        PalmaresError::storage(format!("invalid status in questions row: {}", status_text))
    })?;
    Ok(QuestionRecord {
        id: row.get("id"),
        author_id: row.get("author_id"),
        title: row.get("title"),
        subject: row.get("subject"),
        class_level: row.get("class_level"),
        stake: row.get("stake"),
        status,
        attachments: row.get("attachments"),
        created_at: row.get("created_at"),
    })
}

fn map_answer(row: &PgRow) -> Result<AnswerRecord> {
    let status_text: String = row.get("status");
    let status = AnswerStatus::from_str_opt(&status_text).ok_or_else(|| {
        PalmaresError::storage(format!("invalid status in answers row: {}", status_text))
    })?;
    Ok(AnswerRecord {
        id: row.get("id"),
        question_id: row.get("question_id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        status,
        likes: row.get("likes"),
        attachments: row.get("attachments"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl StorageBackend for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn insert_user(&self, user: UserRecord) -> Result<()> {
        let badges: Vec<String> = user.badges.iter().cloned().collect();
        let customizations: Vec<String> = user.customizations.iter().cloned().collect();
        sqlx::query(
            r#"
            INSERT INTO economy.users
            (id, display_name, role, points, badges, customizations, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.points)
        .bind(&badges)
        .bind(&customizations)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to insert user: {}", e)))?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, role, points, badges, customizations, created_at
            FROM economy.users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to get user: {}", e)))?;
        row.as_ref().map(map_user).transpose()
    }

    async fn adjust_points(&self, user_id: Uuid, delta: i64) -> Result<i64> {
        // Single-statement increment: concurrent calls serialize on the row.
        let row = sqlx::query(
            "UPDATE economy.users SET points = points + $2 WHERE id = $1 RETURNING points",
        )
        .bind(user_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to adjust points: {}", e)))?;
        match row {
            Some(row) => Ok(row.get("points")),
            None => Err(PalmaresError::NotFound(format!("user {} not found", user_id))),
        }
    }

    async fn award_badge(&self, user_id: Uuid, slug: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE economy.users
            SET badges = array_append(badges, $2)
            WHERE id = $1 AND NOT ($2 = ANY(badges))
            "#,
        )
        .bind(user_id)
        .bind(slug)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to award badge: {}", e)))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.user_exists(user_id).await? {
            Ok(false)
        } else {
            Err(PalmaresError::NotFound(format!("user {} not found", user_id)))
        }
    }

    async fn unlock_customization(&self, user_id: Uuid, slug: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE economy.users
            SET customizations = array_append(customizations, $2)
            WHERE id = $1 AND NOT ($2 = ANY(customizations))
            "#,
        )
        .bind(user_id)
        .bind(slug)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to unlock customization: {}", e)))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.user_exists(user_id).await? {
            Ok(false)
        } else {
            Err(PalmaresError::NotFound(format!("user {} not found", user_id)))
        }
    }

    async fn insert_session(&self, token_digest: &str, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.sessions (token_digest, user_id)
            VALUES ($1, $2)
            ON CONFLICT (token_digest) DO UPDATE SET user_id = EXCLUDED.user_id
            "#,
        )
        .bind(token_digest)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to insert session: {}", e)))?;
        Ok(())
    }

    async fn resolve_session(&self, token_digest: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query("SELECT user_id FROM economy.sessions WHERE token_digest = $1")
            .bind(token_digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PalmaresError::storage(format!("Failed to resolve session: {}", e)))?;
        Ok(row.map(|r| r.get("user_id")))
    }

    async fn append_point_transaction(&self, transaction: PointTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.point_transactions
            (id, user_id, action, kind, points, question_id, answer_id, content_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.action.as_str())
        .bind(transaction.kind.as_str())
        .bind(transaction.points)
        .bind(transaction.question_id)
        .bind(transaction.answer_id)
        .bind(transaction.content_id)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to append point transaction: {}", e)))?;
        Ok(())
    }

    async fn point_history(&self, user_id: Uuid) -> Result<Vec<PointTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, action, kind, points, question_id, answer_id, content_id, created_at
            FROM economy.point_transactions
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to get point history: {}", e)))?;
        rows.iter().map(map_point_transaction).collect()
    }

    async fn gem_account(&self, user_id: Uuid) -> Result<GemAccount> {
        let row = sqlx::query(
            r#"
            SELECT user_id, balance, total_earned, total_spent
            FROM economy.gem_accounts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to get gem account: {}", e)))?;
        Ok(match row {
            Some(row) => GemAccount {
                user_id: row.get("user_id"),
                balance: row.get("balance"),
                total_earned: row.get("total_earned"),
                total_spent: row.get("total_spent"),
            },
            None => GemAccount::empty(user_id),
        })
    }

    async fn credit_gems(&self, user_id: Uuid, amount: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO economy.gem_accounts AS g (user_id, balance, total_earned, total_spent)
            VALUES ($1, $2, $2, 0)
            ON CONFLICT (user_id) DO UPDATE
            SET balance = g.balance + $2, total_earned = g.total_earned + $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to credit gems: {}", e)))?;
        Ok(row.get("balance"))
    }

    async fn try_debit_gems(&self, user_id: Uuid, amount: i64) -> Result<DebitOutcome> {
        // The balance guard lives in the statement itself; two racing spends
        // serialize on the row and the loser sees no matching row.
        let row = sqlx::query(
            r#"
            UPDATE economy.gem_accounts
            SET balance = balance - $2, total_spent = total_spent + $2
            WHERE user_id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to debit gems: {}", e)))?;

        if let Some(row) = row {
            return Ok(DebitOutcome::Applied { new_balance: row.get("balance") });
        }

        let current = self.gem_account(user_id).await?.balance;
        Ok(DebitOutcome::Insufficient { current })
    }

    async fn append_gem_transaction(&self, transaction: GemTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.gem_transactions
            (id, user_id, kind, gems, description, status, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.kind.as_str())
        .bind(transaction.gems)
        .bind(&transaction.description)
        .bind(transaction.status.as_str())
        .bind(&transaction.metadata)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to append gem transaction: {}", e)))?;
        Ok(())
    }

    async fn gem_history(&self, user_id: Uuid) -> Result<Vec<GemTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, gems, description, status, metadata, created_at
            FROM economy.gem_transactions
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to get gem history: {}", e)))?;
        rows.iter().map(map_gem_transaction).collect()
    }

    async fn insert_question(&self, question: QuestionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.questions
            (id, author_id, title, subject, class_level, stake, status, attachments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(question.id)
        .bind(question.author_id)
        .bind(&question.title)
        .bind(&question.subject)
        .bind(&question.class_level)
        .bind(question.stake)
        .bind(question.status.as_str())
        .bind(&question.attachments)
        .bind(question.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to insert question: {}", e)))?;
        Ok(())
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<QuestionRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, author_id, title, subject, class_level, stake, status, attachments, created_at
            FROM economy.questions
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to get question: {}", e)))?;
        row.as_ref().map(map_question).transpose()
    }

    async fn set_question_status(&self, question_id: Uuid, status: QuestionStatus) -> Result<()> {
        let result = sqlx::query("UPDATE economy.questions SET status = $2 WHERE id = $1")
            .bind(question_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| PalmaresError::storage(format!("Failed to set question status: {}", e)))?;
        if result.rows_affected() == 0 {
            return Err(PalmaresError::NotFound(format!("question {} not found", question_id)));
        }
        Ok(())
    }

    async fn try_resolve_question(&self, question_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE economy.questions SET status = 'resolue' WHERE id = $1 AND status <> 'resolue'",
        )
        .bind(question_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to resolve question: {}", e)))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        match self.get_question(question_id).await? {
            Some(_) => Ok(false),
            None => Err(PalmaresError::NotFound(format!("question {} not found", question_id))),
        }
    }

    async fn insert_answer(&self, answer: AnswerRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.answers
            (id, question_id, author_id, content, status, likes, attachments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(answer.id)
        .bind(answer.question_id)
        .bind(answer.author_id)
        .bind(&answer.content)
        .bind(answer.status.as_str())
        .bind(answer.likes)
        .bind(&answer.attachments)
        .bind(answer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to insert answer: {}", e)))?;
        Ok(())
    }

    async fn get_answer(&self, answer_id: Uuid) -> Result<Option<AnswerRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, question_id, author_id, content, status, likes, attachments, created_at
            FROM economy.answers
            WHERE id = $1
            "#,
        )
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to get answer: {}", e)))?;
        row.as_ref().map(map_answer).transpose()
    }

    async fn answers_for_question(&self, question_id: Uuid) -> Result<Vec<AnswerRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, question_id, author_id, content, status, likes, attachments, created_at
            FROM economy.answers
            WHERE question_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to list answers: {}", e)))?;
        rows.iter().map(map_answer).collect()
    }

    async fn set_answer_status(&self, answer_id: Uuid, status: AnswerStatus) -> Result<()> {
        let result = sqlx::query("UPDATE economy.answers SET status = $2 WHERE id = $1")
            .bind(answer_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| PalmaresError::storage(format!("Failed to set answer status: {}", e)))?;
        if result.rows_affected() == 0 {
            return Err(PalmaresError::NotFound(format!("answer {} not found", answer_id)));
        }
        Ok(())
    }

    async fn increment_answer_likes(&self, answer_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "UPDATE economy.answers SET likes = likes + 1 WHERE id = $1 RETURNING likes",
        )
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to increment likes: {}", e)))?;
        match row {
            Some(row) => Ok(row.get("likes")),
            None => Err(PalmaresError::NotFound(format!("answer {} not found", answer_id))),
        }
    }

    async fn delete_answer(&self, answer_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM economy.answers WHERE id = $1")
            .bind(answer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PalmaresError::storage(format!("Failed to delete answer: {}", e)))?;
        if result.rows_affected() == 0 {
            return Err(PalmaresError::NotFound(format!("answer {} not found", answer_id)));
        }
        Ok(())
    }

    async fn count_endorsed_answers(&self, author_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM economy.answers
            WHERE author_id = $1 AND status IN ('validee', 'meilleure_reponse')
            "#,
        )
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to count endorsed answers: {}", e)))?;
        Ok(row.get("count"))
    }

    async fn insert_report(&self, report: ReportRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.reports (id, answer_id, status, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(report.id)
        .bind(report.answer_id)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to insert report: {}", e)))?;
        Ok(())
    }

    async fn has_active_report(&self, answer_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM economy.reports WHERE answer_id = $1 AND status = 'active'
            ) AS present
            "#,
        )
        .bind(answer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to check reports: {}", e)))?;
        Ok(row.get("present"))
    }

    async fn insert_content(&self, content: ContentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.contents (id, author_id, kind, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(content.id)
        .bind(content.author_id)
        .bind(&content.kind)
        .bind(content.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to insert content: {}", e)))?;
        Ok(())
    }

    async fn count_content(&self, author_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM economy.contents WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PalmaresError::storage(format!("Failed to count contents: {}", e)))?;
        Ok(row.get("count"))
    }

    async fn insert_partner_offer(&self, offer: PartnerOffer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO economy.partner_offers (id, partner, title, gem_cost, active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(offer.id)
        .bind(&offer.partner)
        .bind(&offer.title)
        .bind(offer.gem_cost)
        .bind(offer.active)
        .execute(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to insert partner offer: {}", e)))?;
        Ok(())
    }

    async fn get_partner_offer(&self, offer_id: Uuid) -> Result<Option<PartnerOffer>> {
        let row = sqlx::query(
            r#"
            SELECT id, partner, title, gem_cost, active
            FROM economy.partner_offers
            WHERE id = $1
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PalmaresError::storage(format!("Failed to get partner offer: {}", e)))?;
        Ok(row.map(|r| PartnerOffer {
            id: r.get("id"),
            partner: r.get("partner"),
            title: r.get("title"),
            gem_cost: r.get("gem_cost"),
            active: r.get("active"),
        }))
    }
}

// Memory-backend tests cover the contract; these queries are exercised
// against a live database in deployment smoke tests.
