//! Entraide forum: questions with point stakes, answers, arbitration.

pub mod engine;
pub mod models;
pub mod notify;

pub use engine::{ArbitrationEngine, ValidationOutcome};
pub use models::{AnswerRecord, AnswerStatus, QuestionRecord, QuestionStatus};
pub use notify::{Notification, NotificationSink, SharedNotifier, TracingNotifier};
