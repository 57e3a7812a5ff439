use std::sync::Arc;

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        UpdateFilterExt, UpdateHandler,
    },
    dptree,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{CallbackQuery, Message, ReplyMarkup, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{cancel, help, start, Command},
    constructor,
    dashboard,
    database::connection::{Connection, RetreiveAttempt},
    generator::GeminiClient,
    keyboard::{action_keyboard, CallbackAction, GENERATE_QUIZ, MY_QUIZZES},
    runner,
    state::QuizState,
    HandlerResult, UserDialogue,
};

type SchemaError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn schema() -> UpdateHandler<SchemaError> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Cancel].endpoint(cancel))
        .branch(case![Command::History].endpoint(dashboard::history::<Connection>));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::Start].endpoint(choose_what_to_do::<Connection>))
        .branch(case![QuizState::ReceiveTopic].endpoint(constructor::receive_topic))
        .branch(
            case![QuizState::ReceiveQuestionCount { topic }]
                .endpoint(constructor::receive_question_count::<Connection, GeminiClient>),
        )
        .branch(
            case![QuizState::Running {
                session,
                attempt,
                message_id
            }]
            .endpoint(runner::running_message),
        )
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(message_handler)
        .branch(callback_query_scheme())
}

fn callback_query_scheme() -> UpdateHandler<SchemaError> {
    use dptree::case;

    tracing::debug!("Building a dispatching tree for callback query");
    Update::filter_callback_query()
        .filter_map(|q: CallbackQuery| q.data.as_deref().and_then(CallbackAction::parse))
        .branch(
            dptree::filter(|action: CallbackAction| matches!(action, CallbackAction::Resume(_)))
                .endpoint(dashboard::resume::<Connection>),
        )
        .branch(
            case![QuizState::Running {
                session,
                attempt,
                message_id
            }]
            .endpoint(runner::take_action::<Connection>),
        )
        .endpoint(stale_callback)
}

async fn choose_what_to_do<Retreiver: RetreiveAttempt>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Retreiver>,
) -> HandlerResult {
    match msg.text() {
        Some(GENERATE_QUIZ) => {
            tracing::info!("{} chooses to generate a new quiz.", msg.chat.id);
            bot.send_message(
                msg.chat.id,
                "Let's generate a quiz! What topic should it cover?",
            )
            .reply_markup(ReplyMarkup::kb_remove())
            .await?;
            dialogue.update(QuizState::ReceiveTopic).await?;
        }
        Some(MY_QUIZZES) => {
            tracing::info!("{} opens quiz history.", msg.chat.id);
            dashboard::history(bot, msg, connection).await?;
        }
        other => {
            tracing::error!("Invalid message {:?} from {}", other, msg.chat.id);
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .reply_markup(action_keyboard())
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip_all, fields(chat_id = %msg.chat.id))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    tracing::info!("{}: invalid input '{:?}'", msg.chat.id, msg.text());
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}

async fn stale_callback(bot: Bot, q: CallbackQuery) -> HandlerResult {
    use teloxide::payloads::AnswerCallbackQuerySetters;

    bot.answer_callback_query(&q.id)
        .text("This quiz is no longer active.")
        .await?;
    Ok(())
}
