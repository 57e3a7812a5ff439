use teloxide::types::MessageId;

use crate::quiz::{bridge::PendingAttempt, session::QuizSession};

#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Start,

    // PART FOR --- GENERATING QUIZ ---
    ReceiveTopic,
    ReceiveQuestionCount {
        topic: String,
    },

    // PART FOR --- RUNNING QUIZ ---
    /// Both the active and the reviewing phase of a session.
    /// `message_id` is the message carrying the session's keyboard.
    Running {
        session: QuizSession,
        attempt: PendingAttempt,
        message_id: MessageId,
    },
}
