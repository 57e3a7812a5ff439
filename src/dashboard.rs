use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{CallbackQuery, Message, ParseMode},
    utils::html,
    Bot,
};
use tracing::instrument;

use crate::{
    database::{
        attempt::{AttemptStatus, QuizAttemptRecord, QuizStats},
        connection::RetreiveAttempt,
    },
    keyboard::{resume_keyboard, CallbackAction},
    quiz::bridge::{resume_attempt, PendingAttempt},
    runner, HandlerResult, UserDialogue,
};

const RECENT_LIMIT: i64 = 10;

#[instrument(level = "info", skip_all, fields(chat_id = %msg.chat.id))]
pub(crate) async fn history<Retreiver: RetreiveAttempt>(
    bot: Bot,
    msg: Message,
    connection: Arc<Retreiver>,
) -> HandlerResult {
    let recent = connection
        .retreive_attempts(msg.chat.id.0, Some(RECENT_LIMIT))
        .await?;
    if recent.is_empty() {
        bot.send_message(msg.chat.id, "No quizzes yet. Generate your first one!")
            .await?;
        return Ok(());
    }
    let stats = connection.retreive_stats(msg.chat.id.0).await?;

    let request = bot
        .send_message(msg.chat.id, history_text(&recent, &stats))
        .parse_mode(ParseMode::Html);
    match resume_keyboard(&recent) {
        Some(keyboard) => request.reply_markup(keyboard).await?,
        None => request.await?,
    };
    Ok(())
}

/// Rebuilds a session from an incomplete attempt. Failures are shown, never replaced by an empty quiz.
#[instrument(level = "info", skip_all, fields(chat_id = %dialogue.chat_id(), action = ?action))]
pub(crate) async fn resume<Retreiver: RetreiveAttempt>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    action: CallbackAction,
    connection: Arc<Retreiver>,
) -> HandlerResult {
    let CallbackAction::Resume(id) = action else {
        return Ok(());
    };
    bot.answer_callback_query(&q.id).await?;
    let chat_id = dialogue.chat_id();

    let Some(record) = connection.retreive_attempt(chat_id.0, id).await? else {
        tracing::info!("{} failed to retreive attempt {}: not found", chat_id, id);
        bot.send_message(chat_id, "Quiz attempt not found.").await?;
        return Ok(());
    };

    match resume_attempt(&record) {
        Ok(session) => {
            runner::start_quiz(&bot, &dialogue, chat_id, session, PendingAttempt::saved(record.id))
                .await
        }
        Err(e) => {
            tracing::warn!("{} cannot resume attempt {}: {}", chat_id, id, e);
            bot.send_message(chat_id, format!("Cannot resume this quiz: {e}"))
                .await?;
            Ok(())
        }
    }
}

pub(crate) fn history_text(records: &[QuizAttemptRecord], stats: &QuizStats) -> String {
    let mut text = format!(
        "<b>Your quizzes</b>\nTotal: {} · Completed: {} · Incomplete: {}\n\
         Average score: {} · Highest: {} · Lowest: {}\nAverage percentage: {}%\n\n<b>Recent</b>\n",
        stats.total_quizzes,
        stats.completed_quizzes,
        stats.incomplete_quizzes,
        stats.average_score,
        stats.highest_score,
        stats.lowest_score,
        stats.average_percentage,
    );

    for record in records {
        let outcome = match (record.status, record.score, record.percentage) {
            (AttemptStatus::Completed, Some(score), Some(percentage)) => format!(
                "✅ {}/{} ({}%)",
                score, record.total_questions, percentage.round()
            ),
            (AttemptStatus::Completed, _, _) => "✅ completed".to_string(),
            (AttemptStatus::Incomplete, _, _) => {
                format!("⏸ incomplete, {} questions", record.total_questions)
            }
        };
        text.push_str(&format!(
            "• {} ({}): {}\n",
            html::escape(&record.topic),
            record.created_at.format("%b %d, %Y %H:%M"),
            outcome
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn record(status: AttemptStatus, score: Option<i32>, total: i32) -> QuizAttemptRecord {
        QuizAttemptRecord {
            id: Uuid::new_v4(),
            user_id: 1,
            topic: "Rust".into(),
            total_questions: total,
            questions_blob: None,
            answers: None,
            score,
            percentage: score.map(|s| s as f64 / total as f64 * 100.0),
            status,
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 0).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn history_lists_outcomes() {
        let records = [
            record(AttemptStatus::Completed, Some(4), 5),
            record(AttemptStatus::Incomplete, None, 3),
        ];
        let stats = QuizStats {
            total_quizzes: 2,
            completed_quizzes: 1,
            incomplete_quizzes: 1,
            average_score: 4.0,
            highest_score: 4,
            lowest_score: 4,
            average_percentage: 80.0,
        };
        let text = history_text(&records, &stats);

        assert!(text.contains("Total: 2 · Completed: 1 · Incomplete: 1"));
        assert!(text.contains("• Rust (Mar 14, 2025 09:26): ✅ 4/5 (80%)"));
        assert!(text.contains("• Rust (Mar 14, 2025 09:26): ⏸ incomplete, 3 questions"));
        assert!(resume_keyboard(&records).is_some());
        assert!(resume_keyboard(&records[..1]).is_none());
    }
}
