use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatAction, Message, ReplyMarkup},
    Bot,
};
use tracing::instrument;

use crate::{
    database::connection::{CompleteAttempt, CreateAttempt},
    generator::{GenerateQuestions, MAX_QUESTIONS},
    quiz::{bridge::AttemptBridge, session::QuizSession, validator},
    runner,
    state::QuizState,
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip_all, fields(chat_id = %msg.chat.id))]
pub(crate) async fn receive_topic(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    match msg.text().map(str::trim) {
        Some(topic) if !topic.is_empty() => {
            tracing::info!("{} chooses topic '{}'", msg.chat.id, topic);
            bot.send_message(
                msg.chat.id,
                format!("How many questions? (1-{MAX_QUESTIONS})"),
            )
            .await?;
            dialogue
                .update(QuizState::ReceiveQuestionCount {
                    topic: topic.to_string(),
                })
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please, enter a topic (e.g. History, Chemistry, Math).")
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(chat_id = %msg.chat.id, topic = %topic))]
pub(crate) async fn receive_question_count<S, G>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    topic: String,
    connection: Arc<S>,
    generator: Arc<G>,
) -> HandlerResult
where
    S: CreateAttempt + CompleteAttempt + Send + Sync + 'static,
    G: GenerateQuestions + Send + Sync + 'static,
{
    let count = match msg.text().and_then(|text| text.trim().parse::<u8>().ok()) {
        Some(count) if (1..=MAX_QUESTIONS).contains(&count) => count,
        _ => {
            bot.send_message(
                msg.chat.id,
                format!("Number of questions must be between 1 and {MAX_QUESTIONS}."),
            )
            .await?;
            return Ok(());
        }
    };

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
    bot.send_message(msg.chat.id, "Generating questions...")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;

    let raw = match generator.generate(&topic, count).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("{}: generation failed for '{}': {}", msg.chat.id, topic, e);
            bot.send_message(
                msg.chat.id,
                format!("Failed to generate questions: {e}\nSend a number to try again or /cancel."),
            )
            .await?;
            return Ok(());
        }
    };

    let questions = match validator::validate(raw) {
        Ok(questions) => questions,
        Err(e) => {
            tracing::warn!("{}: generated quiz for '{}' is invalid: {}", msg.chat.id, topic, e);
            bot.send_message(
                msg.chat.id,
                format!("The generated quiz was invalid ({e}).\nSend a number to try again or /cancel."),
            )
            .await?;
            return Ok(());
        }
    };

    let session = QuizSession::new(topic, questions);
    let attempt = AttemptBridge::new(connection, msg.chat.id.0)
        .begin_attempt(session.topic(), session.questions());

    runner::start_quiz(&bot, &dialogue, msg.chat.id, session, attempt).await
}
