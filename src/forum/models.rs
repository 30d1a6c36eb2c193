//! Question and Answer records plus their status machines.
//!
//! Status names keep the platform's French vocabulary on the wire and in
//! storage. Transitions are performed by the arbitration engine only;
//! moderation tooling may overwrite a status directly as an administrative
//! override, which is outside arbitration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// NonValidee → Validee → Resolue. Resolue is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    NonValidee,
    Validee,
    Resolue,
}

impl QuestionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestionStatus::Resolue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::NonValidee => "non_validee",
            QuestionStatus::Validee => "validee",
            QuestionStatus::Resolue => "resolue",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<QuestionStatus> {
        match value {
            "non_validee" => Some(QuestionStatus::NonValidee),
            "validee" => Some(QuestionStatus::Validee),
            "resolue" => Some(QuestionStatus::Resolue),
            _ => None,
        }
    }
}

/// Proposee → Validee (staff) or Proposee → MeilleureReponse (owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Proposee,
    Validee,
    MeilleureReponse,
}

impl AnswerStatus {
    /// Statuses counted by the "validated or best answer" badge aggregate.
    pub fn is_endorsed(&self) -> bool {
        matches!(self, AnswerStatus::Validee | AnswerStatus::MeilleureReponse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStatus::Proposee => "proposee",
            AnswerStatus::Validee => "validee",
            AnswerStatus::MeilleureReponse => "meilleure_reponse",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<AnswerStatus> {
        match value {
            "proposee" => Some(AnswerStatus::Proposee),
            "validee" => Some(AnswerStatus::Validee),
            "meilleure_reponse" => Some(AnswerStatus::MeilleureReponse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub subject: String,
    pub class_level: String,
    /// Point stake escrowed at creation, paid to the best answer's author.
    pub stake: i64,
    pub status: QuestionStatus,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl QuestionRecord {
    pub fn new(
        author_id: Uuid,
        title: String,
        subject: String,
        class_level: String,
        stake: i64,
        attachments: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            subject,
            class_level,
            stake,
            status: QuestionStatus::NonValidee,
            attachments,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub status: AnswerStatus,
    pub likes: i64,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn new(
        question_id: Uuid,
        author_id: Uuid,
        content: String,
        attachments: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            author_id,
            content,
            status: AnswerStatus::Proposee,
            likes: 0,
            attachments,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_status_round_trip() {
        for status in [
            QuestionStatus::NonValidee,
            QuestionStatus::Validee,
            QuestionStatus::Resolue,
        ] {
            assert_eq!(QuestionStatus::from_str_opt(status.as_str()), Some(status));
        }
        assert_eq!(QuestionStatus::from_str_opt("closed"), None);
    }

    #[test]
    fn test_answer_status_round_trip() {
        for status in [
            AnswerStatus::Proposee,
            AnswerStatus::Validee,
            AnswerStatus::MeilleureReponse,
        ] {
            assert_eq!(AnswerStatus::from_str_opt(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_only_resolue_is_terminal() {
        assert!(!QuestionStatus::NonValidee.is_terminal());
        assert!(!QuestionStatus::Validee.is_terminal());
        assert!(QuestionStatus::Resolue.is_terminal());
    }

    #[test]
    fn test_endorsed_statuses() {
        assert!(!AnswerStatus::Proposee.is_endorsed());
        assert!(AnswerStatus::Validee.is_endorsed());
        assert!(AnswerStatus::MeilleureReponse.is_endorsed());
    }

    #[test]
    fn test_new_records_start_in_initial_states() {
        let question = QuestionRecord::new(
            Uuid::new_v4(),
            "Limite de suite".to_string(),
            "maths".to_string(),
            "terminale".to_string(),
            10,
            vec![],
        );
        assert_eq!(question.status, QuestionStatus::NonValidee);

        let answer = AnswerRecord::new(question.id, Uuid::new_v4(), "reponse".to_string(), vec![]);
        assert_eq!(answer.status, AnswerStatus::Proposee);
        assert_eq!(answer.likes, 0);
    }
}
