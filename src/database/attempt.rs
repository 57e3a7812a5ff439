use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::StoreError,
    quiz::{ledger::AnswerLedger, scoring::ScoreResult},
};

pub type AttemptId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Incomplete,
    Completed,
}

/// A persisted quiz attempt, as held by the attempt store.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttemptRecord {
    pub id: AttemptId,
    pub user_id: i64,
    pub topic: String,
    pub total_questions: i32,
    /// Opaque serialized question set; decoded only through the validator.
    pub questions_blob: Option<String>,
    pub answers: Option<String>,
    pub score: Option<i32>,
    pub percentage: Option<f64>,
    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Row shape of `quiz_attempts`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AttemptRow {
    pub(crate) uuid: Uuid,
    pub(crate) user_id: i64,
    pub(crate) topic: String,
    pub(crate) total_questions: i32,
    pub(crate) questions_data: Option<String>,
    pub(crate) answers: Option<String>,
    pub(crate) score: Option<i32>,
    pub(crate) percentage: Option<f64>,
    pub(crate) status: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
}

/// Completion payload written by `complete_attempt`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptUpdate {
    pub answers: String,
    pub score: i32,
    pub total_questions: i32,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Incomplete => "incomplete",
            AttemptStatus::Completed => "completed",
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incomplete" => Ok(AttemptStatus::Incomplete),
            "completed" => Ok(AttemptStatus::Completed),
            other => Err(StoreError::UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<AttemptRow> for QuizAttemptRecord {
    type Error = StoreError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.uuid,
            user_id: row.user_id,
            topic: row.topic,
            total_questions: row.total_questions,
            questions_blob: row.questions_data,
            answers: row.answers,
            score: row.score,
            percentage: row.percentage,
            status: row.status.parse()?,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

impl AttemptUpdate {
    pub fn new(result: &ScoreResult, ledger: &AnswerLedger) -> Result<Self, StoreError> {
        let answers: std::collections::BTreeMap<usize, &str> = ledger.iter().collect();
        Ok(Self {
            answers: serde_json::to_string(&answers)?,
            score: result.score as i32,
            total_questions: result.total as i32,
        })
    }

    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.score as f64 / self.total_questions as f64 * 100.0
        }
    }
}

/// Per-user totals over every attempt. Score figures cover completed attempts only.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStats {
    pub total_quizzes: i64,
    pub completed_quizzes: i64,
    pub incomplete_quizzes: i64,
    pub average_score: f64,
    pub highest_score: i32,
    pub lowest_score: i32,
    pub average_percentage: f64,
}

/// Aggregates as returned by the stats query; all `None` without completed attempts.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StatsRow {
    pub(crate) total: i64,
    pub(crate) completed: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) highest_score: Option<i32>,
    pub(crate) lowest_score: Option<i32>,
    pub(crate) average_percentage: Option<f64>,
}

impl From<StatsRow> for QuizStats {
    fn from(row: StatsRow) -> Self {
        Self {
            total_quizzes: row.total,
            completed_quizzes: row.completed,
            incomplete_quizzes: row.total - row.completed,
            average_score: round2(row.average_score.unwrap_or(0.0)),
            highest_score: row.highest_score.unwrap_or(0),
            lowest_score: row.lowest_score.unwrap_or(0),
            average_percentage: round2(row.average_percentage.unwrap_or(0.0)),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl QuizAttemptRecord {
    pub fn is_incomplete(&self) -> bool {
        self.status == AttemptStatus::Incomplete
    }
}
