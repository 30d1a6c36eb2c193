//! Notification seam for arbitration events.
//!
//! Delivery is fire-and-forget: arbitration outcomes are already committed
//! when a notification is dispatched, so a sink must never fail the flow.
//! The default sink writes structured log lines; a push/websocket sink can
//! be swapped in behind the same trait.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

/// Event delivered to a question or answer author after arbitration moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Someone answered the recipient's question.
    AnswerReceived {
        recipient: Uuid,
        question_id: Uuid,
        answer_id: Uuid,
    },
    /// Staff endorsed the recipient's answer.
    AnswerEndorsed {
        recipient: Uuid,
        question_id: Uuid,
        answer_id: Uuid,
    },
    /// The question owner chose the recipient's answer; `points` is the
    /// stake that was paid out.
    BestAnswerChosen {
        recipient: Uuid,
        question_id: Uuid,
        answer_id: Uuid,
        points: i64,
    },
}

impl Notification {
    pub fn recipient(&self) -> Uuid {
        match self {
            Notification::AnswerReceived { recipient, .. }
            | Notification::AnswerEndorsed { recipient, .. }
            | Notification::BestAnswerChosen { recipient, .. } => *recipient,
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn dispatch(&self, notification: &Notification);
}

pub type SharedNotifier = Arc<dyn NotificationSink>;

/// Default sink: one structured log line per event.
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn dispatch(&self, notification: &Notification) {
        match notification {
            Notification::AnswerReceived {
                recipient,
                question_id,
                answer_id,
            } => {
                info!(
                    recipient = %recipient,
                    question_id = %question_id,
                    answer_id = %answer_id,
                    "notify: answer received"
                );
            }
            Notification::AnswerEndorsed {
                recipient,
                question_id,
                answer_id,
            } => {
                info!(
                    recipient = %recipient,
                    question_id = %question_id,
                    answer_id = %answer_id,
                    "notify: answer endorsed"
                );
            }
            Notification::BestAnswerChosen {
                recipient,
                question_id,
                answer_id,
                points,
            } => {
                info!(
                    recipient = %recipient,
                    question_id = %question_id,
                    answer_id = %answer_id,
                    points,
                    "notify: best answer chosen"
                );
            }
        }
    }
}
