//! Reconciles persisted quiz attempts with live sessions.
//!
//! Beginning an attempt is reported in the background so navigation never
//! waits on the store. Completion waits until that report has resolved and is
//! skipped when no attempt identity was obtained.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    database::{
        attempt::{AttemptId, AttemptUpdate, QuizAttemptRecord},
        connection::{CompleteAttempt, CreateAttempt},
    },
    error::{PersistenceUnavailable, ResumeError, SessionError},
};

use super::{ledger::AnswerLedger, scoring::ScoreResult, session::QuizSession, validator, QuestionSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptSlot {
    Pending,
    Saved(AttemptId),
    Unsaved(String),
}

/// Identity of the attempt behind a session, possibly still being created.
#[derive(Debug, Clone)]
pub struct PendingAttempt {
    slot: watch::Receiver<AttemptSlot>,
}

impl PendingAttempt {
    pub fn saved(id: AttemptId) -> Self {
        let (_tx, slot) = watch::channel(AttemptSlot::Saved(id));
        Self { slot }
    }

    pub fn unsaved(reason: impl Into<String>) -> Self {
        let (_tx, slot) = watch::channel(AttemptSlot::Unsaved(reason.into()));
        Self { slot }
    }

    /// Current state without waiting.
    pub fn peek(&self) -> AttemptSlot {
        self.slot.borrow().clone()
    }

    /// Waits until the begin report has either succeeded or definitively failed.
    pub async fn resolve(&self) -> Result<AttemptId, PersistenceUnavailable> {
        let mut slot = self.slot.clone();
        let resolved = slot
            .wait_for(|s| !matches!(s, AttemptSlot::Pending))
            .await
            .map(|s| s.clone())
            .unwrap_or_else(|_| AttemptSlot::Unsaved("attempt report was abandoned".into()));

        match resolved {
            AttemptSlot::Saved(id) => Ok(id),
            AttemptSlot::Unsaved(reason) => Err(PersistenceUnavailable(reason)),
            AttemptSlot::Pending => Err(PersistenceUnavailable("attempt report never resolved".into())),
        }
    }
}

pub struct AttemptBridge<S> {
    store: Arc<S>,
    user_id: i64,
}

impl<S> AttemptBridge<S>
where
    S: CreateAttempt + CompleteAttempt + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, user_id: i64) -> Self {
        Self { store, user_id }
    }

    /// Reports a new incomplete attempt without blocking the caller.
    pub fn begin_attempt(&self, topic: &str, questions: &QuestionSet) -> PendingAttempt {
        let (tx, slot) = watch::channel(AttemptSlot::Pending);
        let store = self.store.clone();
        let user_id = self.user_id;
        let topic = topic.to_string();
        let questions = questions.clone();

        tokio::spawn(async move {
            let resolved = match store.create_attempt(user_id, &topic, &questions).await {
                Ok(id) => {
                    tracing::info!("{} began attempt {} on '{}'", user_id, id, topic);
                    AttemptSlot::Saved(id)
                }
                Err(e) => {
                    tracing::warn!("Failed to record attempt for {} on '{}': {}", user_id, topic, e);
                    AttemptSlot::Unsaved(e.to_string())
                }
            };
            let _ = tx.send(resolved);
        });

        PendingAttempt { slot }
    }

    /// Restarts a reviewed session and reports it as a new attempt.
    pub fn retake(&self, session: &mut QuizSession) -> Result<PendingAttempt, SessionError> {
        session.reset()?;
        Ok(self.begin_attempt(session.topic(), session.questions()))
    }

    /// Reports completion once the attempt identity is known.
    ///
    /// Returns [`PersistenceUnavailable`] when the attempt was never created or
    /// the update failed; the session's result stands either way.
    pub async fn complete_attempt(
        &self,
        attempt: &PendingAttempt,
        result: &ScoreResult,
        ledger: &AnswerLedger,
    ) -> Result<AttemptId, PersistenceUnavailable> {
        let id = match attempt.resolve().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Skipping completion report for {}: {}", self.user_id, e);
                return Err(e);
            }
        };

        let update = AttemptUpdate::new(result, ledger).map_err(|e| PersistenceUnavailable(e.to_string()))?;
        match self.store.complete_attempt(self.user_id, id, update).await {
            Ok(()) => {
                tracing::info!(
                    "{} completed attempt {} with {}/{}",
                    self.user_id,
                    id,
                    result.score,
                    result.total
                );
                Ok(id)
            }
            Err(e) => {
                tracing::warn!("Failed to complete attempt {}: {}", id, e);
                Err(PersistenceUnavailable(e.to_string()))
            }
        }
    }
}

/// Rebuilds an active session from a stored incomplete attempt.
///
/// The ledger always starts empty: stored incomplete attempts carry no answers.
pub fn resume_attempt(record: &QuizAttemptRecord) -> Result<QuizSession, ResumeError> {
    if !record.is_incomplete() {
        return Err(ResumeError::AlreadyCompleted(record.id));
    }

    let blob = match record.questions_blob.as_deref() {
        Some(blob) if !blob.trim().is_empty() => blob,
        _ => return Err(ResumeError::NoQuestions),
    };
    let questions = validator::validate_blob(blob)?;

    tracing::info!(
        "Resuming attempt {} on '{}' with {} questions",
        record.id,
        record.topic,
        questions.len()
    );
    Ok(QuizSession::new(record.topic.clone(), questions))
}
