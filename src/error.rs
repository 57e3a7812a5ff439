use thiserror::Error;

use crate::database::attempt::AttemptId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed question blob: {0}")]
    MalformedBlob(String),
    #[error("question set is empty")]
    Empty,
    #[error("question #{} is invalid: {reason}", .index + 1)]
    InvalidQuestion { index: usize, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResumeError {
    #[error("attempt has no questions")]
    NoQuestions,
    #[error("attempt {0} is already completed")]
    AlreadyCompleted(AttemptId),
    #[error("cannot resume: {0}")]
    ResumeFailed(#[source] ValidationError),
}

impl From<ValidationError> for ResumeError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Empty => ResumeError::NoQuestions,
            other => ResumeError::ResumeFailed(other),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("question index {index} is out of range ({total} questions)")]
    IndexOutOfRange { index: usize, total: usize },
    #[error("option {option} is out of range ({total} options)")]
    OptionOutOfRange { option: usize, total: usize },
    #[error("question #{} has not been answered yet", .0 + 1)]
    Unanswered(usize),
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("quiz is no longer active")]
    NotActive,
    #[error("quiz is not finished yet")]
    NotReviewing,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("topic cannot be empty")]
    EmptyTopic,
    #[error("number of questions must be between 1 and 20, got {0}")]
    CountOutOfRange(u8),
    #[error("question generator request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected generator response: {0}")]
    UnexpectedResponse(String),
    #[error("generator returned undecodable questions: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("quiz attempt not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to encode attempt data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unknown attempt status '{0}'")]
    UnknownStatus(String),
}

/// The attempt record may not have been durably saved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("persistence unavailable: {0}")]
pub struct PersistenceUnavailable(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),
    #[error("{var} can't be parsed: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_validation_becomes_no_questions_on_resume() {
        assert_eq!(ResumeError::from(ValidationError::Empty), ResumeError::NoQuestions);
    }

    #[test]
    fn other_validation_failures_become_resume_failed() {
        let err = ResumeError::from(ValidationError::MalformedBlob("null sentinel".into()));
        assert_eq!(
            err,
            ResumeError::ResumeFailed(ValidationError::MalformedBlob("null sentinel".into()))
        );
        assert_eq!(err.to_string(), "cannot resume: malformed question blob: null sentinel");
    }

    #[test]
    fn invalid_question_is_reported_one_based() {
        let err = ValidationError::InvalidQuestion {
            index: 0,
            reason: "missing text".into(),
        };
        assert_eq!(err.to_string(), "question #1 is invalid: missing text");
    }
}
