use std::borrow::Cow;
use std::error::Error;
use std::sync::Arc;

use dotenvy::dotenv;
use quizgenbot::config::Config;
use quizgenbot::database::connection::Connection;
use quizgenbot::generator::GeminiClient;
use quizgenbot::schema::schema;
use quizgenbot::state::QuizState;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

type MainResult = Result<(), Box<dyn Error + Send + Sync + 'static>>;

#[tokio::main]
async fn main() -> MainResult {
    dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.log_level)?;

    let connection = Arc::new(Connection::connect(Cow::Borrowed(config.database_url.as_str())).await?);
    connection.run_migrations().await?;

    let generator = Arc::new(GeminiClient::new(
        config.google_api_key.as_str(),
        &config.gemini_model,
    )?);

    let bot = Bot::new(config.teloxide_token.as_str());
    tracing::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![
            InMemStorage::<QuizState>::new(),
            connection,
            generator
        ])
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook) = config.webhook {
        let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }

    Ok(())
}

fn init_tracing(level: &str) -> MainResult {
    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level)?)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
