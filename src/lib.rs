use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod commands;
pub mod config;
pub mod constructor;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod generator;
pub mod keyboard;
pub mod quiz;
pub mod runner;
pub mod schema;
pub mod state;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
