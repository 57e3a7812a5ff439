use std::{borrow::Cow, future::Future};

use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::{error::StoreError, quiz::QuestionSet};

use super::attempt::{
    AttemptId, AttemptRow, AttemptStatus, AttemptUpdate, QuizAttemptRecord, QuizStats, StatsRow,
};

const ATTEMPT_COLUMNS: &str = "uuid, user_id, topic, total_questions, questions_data, answers, \
     score, percentage, status, created_at, completed_at";

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: Cow<'_, str>) -> Result<Self, StoreError> {
        let pool = PgPool::connect(&connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        tracing::debug!("Running migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

pub trait CreateAttempt {
    /// Stores a new attempt with status `incomplete`.
    fn create_attempt(
        &self,
        user_id: i64,
        topic: &str,
        questions: &QuestionSet,
    ) -> impl Future<Output = Result<AttemptId, StoreError>> + Send;
}

pub trait RetreiveAttempt {
    fn retreive_attempt(
        &self,
        user_id: i64,
        id: AttemptId,
    ) -> impl Future<Output = Result<Option<QuizAttemptRecord>, StoreError>> + Send;

    /// Newest first. `None` returns every attempt of the user.
    fn retreive_attempts(
        &self,
        user_id: i64,
        limit: Option<i64>,
    ) -> impl Future<Output = Result<Vec<QuizAttemptRecord>, StoreError>> + Send;

    /// Aggregated over all of the user's attempts.
    fn retreive_stats(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<QuizStats, StoreError>> + Send;
}

pub trait CompleteAttempt {
    fn complete_attempt(
        &self,
        user_id: i64,
        id: AttemptId,
        update: AttemptUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl CreateAttempt for Connection {
    async fn create_attempt(
        &self,
        user_id: i64,
        topic: &str,
        questions: &QuestionSet,
    ) -> Result<AttemptId, StoreError> {
        let blob = questions.to_blob()?;

        tracing::debug!("Adding attempt for {} on '{}'", user_id, topic);
        let uuid: Uuid = sqlx::query_scalar(
            "INSERT INTO quiz_attempts (uuid, user_id, topic, total_questions, questions_data, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING uuid",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(topic)
        .bind(questions.len() as i32)
        .bind(blob)
        .bind(AttemptStatus::Incomplete.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(uuid)
    }
}

impl RetreiveAttempt for Connection {
    async fn retreive_attempt(
        &self,
        user_id: i64,
        id: AttemptId,
    ) -> Result<Option<QuizAttemptRecord>, StoreError> {
        let row: Option<AttemptRow> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE uuid = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(QuizAttemptRecord::try_from).transpose()
    }

    async fn retreive_attempts(
        &self,
        user_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<QuizAttemptRecord>, StoreError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QuizAttemptRecord::try_from).collect()
    }

    async fn retreive_stats(&self, user_id: i64) -> Result<QuizStats, StoreError> {
        tracing::debug!("Aggregating attempts of {}", user_id);
        let row: StatsRow = sqlx::query_as(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE status = $2) AS completed, \
             (AVG(score) FILTER (WHERE status = $2))::DOUBLE PRECISION AS average_score, \
             MAX(score) FILTER (WHERE status = $2) AS highest_score, \
             MIN(score) FILTER (WHERE status = $2) AS lowest_score, \
             AVG(percentage) FILTER (WHERE status = $2) AS average_percentage \
             FROM quiz_attempts WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(AttemptStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

impl CompleteAttempt for Connection {
    async fn complete_attempt(
        &self,
        user_id: i64,
        id: AttemptId,
        update: AttemptUpdate,
    ) -> Result<(), StoreError> {
        tracing::debug!("Completing attempt {} with score {}", id, update.score);
        let updated = sqlx::query(
            "UPDATE quiz_attempts SET answers = $1, score = $2, total_questions = $3, \
             percentage = $4, status = $5, completed_at = now() \
             WHERE uuid = $6 AND user_id = $7",
        )
        .bind(&update.answers)
        .bind(update.score)
        .bind(update.total_questions)
        .bind(update.percentage())
        .bind(AttemptStatus::Completed.as_str())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
