use std::sync::Arc;

use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{
        CallbackQuery, ChatId, InlineKeyboardMarkup, Message, MessageId, ParseMode, ReplyMarkup,
    },
    utils::html,
    ApiError, Bot, RequestError,
};
use tracing::instrument;

use crate::{
    database::connection::{CompleteAttempt, CreateAttempt},
    keyboard::{question_keyboard, CallbackAction},
    quiz::{
        bridge::{AttemptBridge, PendingAttempt},
        option_letter,
        scoring::ScoreResult,
        session::{QuizSession, Transition},
    },
    state::QuizState,
    HandlerResult, UserDialogue,
};

const PROGRESS_CELLS: usize = 10;

/// Stores the session and posts its first question.
pub(crate) async fn start_quiz(
    bot: &Bot,
    dialogue: &UserDialogue,
    chat_id: ChatId,
    session: QuizSession,
    attempt: PendingAttempt,
) -> HandlerResult {
    tracing::info!(
        "{}: starting quiz '{}' with {} questions",
        chat_id,
        session.topic(),
        session.total()
    );
    bot.send_message(chat_id, "Let's begin!")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;

    show(bot, dialogue, chat_id, session, attempt).await
}

/// Posts the session's current screen as a new message and makes it the live one.
async fn show(
    bot: &Bot,
    dialogue: &UserDialogue,
    chat_id: ChatId,
    session: QuizSession,
    attempt: PendingAttempt,
) -> HandlerResult {
    let sent = bot
        .send_message(chat_id, render(&session))
        .parse_mode(ParseMode::Html)
        .reply_markup(question_keyboard(&session))
        .await?;
    dialogue
        .update(QuizState::Running {
            session,
            attempt,
            message_id: sent.id,
        })
        .await?;
    Ok(())
}

/// Only the newest quiz message accepts button presses.
pub(crate) fn is_live(pressed: Option<MessageId>, live: MessageId) -> bool {
    pressed == Some(live)
}

#[instrument(level = "info", skip_all, fields(chat_id = %dialogue.chat_id(), action = ?action))]
pub(crate) async fn take_action<S>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    action: CallbackAction,
    (mut session, mut attempt, message_id): (QuizSession, PendingAttempt, MessageId),
    connection: Arc<S>,
) -> HandlerResult
where
    S: CreateAttempt + CompleteAttempt + Send + Sync + 'static,
{
    let chat_id = dialogue.chat_id();
    let pressed = q.message.as_ref().map(|message| message.id());
    if !is_live(pressed, message_id) {
        tracing::info!("{}: button pressed on an old quiz message", chat_id);
        bot.answer_callback_query(&q.id)
            .text("That message is outdated. Here is your current quiz.")
            .await?;
        return show(&bot, &dialogue, chat_id, session, attempt).await;
    }
    let bridge = AttemptBridge::new(connection, chat_id.0);

    let outcome = match action {
        CallbackAction::Select(option) => {
            session.select(option).map(str::to_string).map(|answer| {
                tracing::info!("{}: selects '{}' in '{}'", chat_id, answer, session.topic());
            })
        }
        CallbackAction::Next => session.advance().map(|transition| {
            if let Transition::Completed(result) = transition {
                tracing::info!(
                    "{} completed a quiz '{}' with result {}/{}",
                    chat_id,
                    session.topic(),
                    result.score,
                    result.total
                );
                report_completion(&bot, chat_id, bridge, &attempt, &session, result);
            }
        }),
        CallbackAction::Previous => session.retreat().map(|_| ()),
        CallbackAction::Retake => bridge.retake(&mut session).map(|retaken| {
            attempt = retaken;
        }),
        CallbackAction::NewQuiz => {
            bot.answer_callback_query(&q.id).await?;
            bot.send_message(chat_id, "Let's generate a new quiz! What topic?")
                .await?;
            dialogue.update(QuizState::ReceiveTopic).await?;
            return Ok(());
        }
        CallbackAction::Resume(_) => Ok(()),
    };

    if let Err(e) = outcome {
        tracing::warn!("{}: rejected {:?}: {}", chat_id, action, e);
        bot.answer_callback_query(&q.id)
            .text(e.to_string())
            .await?;
        return Ok(());
    }

    bot.answer_callback_query(&q.id).await?;
    let text = render(&session);
    let keyboard = question_keyboard(&session);
    dialogue
        .update(QuizState::Running {
            session,
            attempt,
            message_id,
        })
        .await?;

    edit(&bot, chat_id, message_id, text, keyboard).await
}

/// Text typed while a quiz is on screen.
#[instrument(level = "info", skip_all, fields(chat_id = %msg.chat.id))]
pub(crate) async fn running_message(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (session, attempt, _message_id): (QuizSession, PendingAttempt, MessageId),
) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Please, use the buttons under the question. Enter /cancel to leave the quiz.",
    )
    .await?;
    show(&bot, &dialogue, msg.chat.id, session, attempt).await
}

async fn edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> HandlerResult {
    match bot
        .edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
    {
        Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Fire-and-report: the result is already shown, the user only hears about failures.
fn report_completion<S>(
    bot: &Bot,
    chat_id: ChatId,
    bridge: AttemptBridge<S>,
    attempt: &PendingAttempt,
    session: &QuizSession,
    result: ScoreResult,
) where
    S: CreateAttempt + CompleteAttempt + Send + Sync + 'static,
{
    let bot = bot.clone();
    let attempt = attempt.clone();
    let ledger = session.ledger().clone();

    tokio::spawn(async move {
        if let Err(e) = bridge.complete_attempt(&attempt, &result, &ledger).await {
            if let Err(send_err) = bot
                .send_message(
                    chat_id,
                    format!("⚠️ Your result may not have been saved ({e})."),
                )
                .await
            {
                tracing::error!("{}: failed to send save warning: {}", chat_id, send_err);
            }
        }
    });
}

pub(crate) fn render(session: &QuizSession) -> String {
    match session.result() {
        Some(result) => results_text(session, result),
        None => question_text(session),
    }
}

pub(crate) fn question_text(session: &QuizSession) -> String {
    let (Some(current), Some(question)) = (session.current_index(), session.current_question())
    else {
        return String::new();
    };
    let progress = session.progress().unwrap_or_default();
    let filled = (progress * PROGRESS_CELLS as f64).round() as usize;

    format!(
        "<b>Quiz: {}</b>\n{}{}\nQuestion {} of {}\n\n{}",
        html::escape(session.topic()),
        "▰".repeat(filled),
        "▱".repeat(PROGRESS_CELLS - filled),
        current + 1,
        session.total(),
        html::escape(question.text()),
    )
}

pub(crate) fn results_text(session: &QuizSession, result: &ScoreResult) -> String {
    let mut review = String::new();
    for outcome in &result.per_question {
        let Some(question) = session.questions().get(outcome.question_index) else {
            continue;
        };
        let mark = if outcome.is_correct { '✅' } else { '❌' };
        let given = outcome.user_answer.as_deref().unwrap_or("—");
        review.push_str(&format!(
            "{} {}. {}\n   Your answer: {}",
            mark,
            outcome.question_index + 1,
            html::escape(question.text()),
            html::escape(given),
        ));
        if !outcome.is_correct {
            review.push_str(&format!(
                "\n   Correct: {}) {}",
                option_letter(question.correct_option_index()),
                html::escape(&outcome.correct_answer)
            ));
        }
        review.push('\n');
    }

    format!(
        "<b>Quiz Results</b>\n{}/{} ({}%)\n\nTopic: {}\nYou answered {} out of {} questions correctly!\n{}\n\n{}",
        result.score,
        result.total,
        result.rounded_percentage(),
        html::escape(session.topic()),
        result.score,
        result.total,
        result.band().message(),
        review.trim_end(),
    )
}
