use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use uuid::Uuid;

use crate::{
    database::attempt::{AttemptId, QuizAttemptRecord},
    quiz::{option_letter, session::QuizSession},
};

pub(crate) const GENERATE_QUIZ: &str = "Generate a quiz🧠";
pub(crate) const MY_QUIZZES: &str = "My quizzes📊";

/// Payload carried by inline buttons. Kept short: Telegram allows 64 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Select(usize),
    Next,
    Previous,
    Retake,
    NewQuiz,
    Resume(AttemptId),
}

impl CallbackAction {
    pub fn to_data(&self) -> String {
        match self {
            CallbackAction::Select(option) => format!("opt:{option}"),
            CallbackAction::Next => "next".into(),
            CallbackAction::Previous => "prev".into(),
            CallbackAction::Retake => "retake".into(),
            CallbackAction::NewQuiz => "new".into(),
            CallbackAction::Resume(id) => format!("resume:{id}"),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "next" => Some(CallbackAction::Next),
            "prev" => Some(CallbackAction::Previous),
            "retake" => Some(CallbackAction::Retake),
            "new" => Some(CallbackAction::NewQuiz),
            other => {
                if let Some(option) = other.strip_prefix("opt:") {
                    option.parse().ok().map(CallbackAction::Select)
                } else if let Some(id) = other.strip_prefix("resume:") {
                    Uuid::parse_str(id).ok().map(CallbackAction::Resume)
                } else {
                    None
                }
            }
        }
    }
}

pub(crate) fn action_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = vec![vec![
        KeyboardButton::new(GENERATE_QUIZ),
        KeyboardButton::new(MY_QUIZZES),
    ]];

    KeyboardMarkup::new(keyboard)
}

/// Options of the current question plus navigation. `Next` only appears once answered.
pub(crate) fn question_keyboard(session: &QuizSession) -> InlineKeyboardMarkup {
    let (Some(current), Some(question)) = (session.current_index(), session.current_question())
    else {
        return results_keyboard();
    };
    let selected = session.selected_option();

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = question
        .options()
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let mark = if selected == Some(i) { "✅ " } else { "" };
            vec![InlineKeyboardButton::callback(
                format!("{mark}{}) {option}", option_letter(i)),
                CallbackAction::Select(i).to_data(),
            )]
        })
        .collect();

    let mut navigation = Vec::new();
    if current > 0 {
        navigation.push(InlineKeyboardButton::callback(
            "⬅️ Previous",
            CallbackAction::Previous.to_data(),
        ));
    }
    if session.is_answered(current) {
        let label = if current + 1 == session.total() {
            "Finish Quiz 🏁"
        } else {
            "Next ➡️"
        };
        navigation.push(InlineKeyboardButton::callback(
            label,
            CallbackAction::Next.to_data(),
        ));
    }
    if !navigation.is_empty() {
        keyboard.push(navigation);
    }

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn results_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("🔁 Retake Quiz", CallbackAction::Retake.to_data()),
        InlineKeyboardButton::callback("🧠 Generate New Quiz", CallbackAction::NewQuiz.to_data()),
    ]])
}

/// One resume button per incomplete attempt.
pub(crate) fn resume_keyboard(records: &[QuizAttemptRecord]) -> Option<InlineKeyboardMarkup> {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = records
        .iter()
        .filter(|record| record.is_incomplete())
        .map(|record| {
            vec![InlineKeyboardButton::callback(
                format!("▶️ Resume: {}", record.topic),
                CallbackAction::Resume(record.id).to_data(),
            )]
        })
        .collect();

    (!keyboard.is_empty()).then(|| InlineKeyboardMarkup::new(keyboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::tests::abcd_set;

    #[test]
    fn callback_data_parses_back() {
        let id = Uuid::new_v4();
        for action in [
            CallbackAction::Select(3),
            CallbackAction::Next,
            CallbackAction::Previous,
            CallbackAction::Retake,
            CallbackAction::NewQuiz,
            CallbackAction::Resume(id),
        ] {
            let data = action.to_data();
            assert!(data.len() <= 64, "{data} is too long");
            assert_eq!(CallbackAction::parse(&data), Some(action));
        }
    }

    #[test]
    fn unknown_callback_data_is_ignored() {
        assert_eq!(CallbackAction::parse("opt:x"), None);
        assert_eq!(CallbackAction::parse("resume:123"), None);
        assert_eq!(CallbackAction::parse("finish"), None);
    }

    #[test]
    fn next_button_needs_an_answer() {
        let mut session = QuizSession::new("Rust", abcd_set(2));
        let keyboard = question_keyboard(&session);
        assert_eq!(keyboard.inline_keyboard.len(), 4);

        session.select(1).unwrap();
        let keyboard = question_keyboard(&session);
        assert_eq!(keyboard.inline_keyboard.len(), 5);
        assert_eq!(keyboard.inline_keyboard[4][0].text, "Next ➡️");
        assert!(keyboard.inline_keyboard[1][0].text.starts_with("✅ "));
    }

    #[test]
    fn last_question_offers_finish_and_previous() {
        let mut session = QuizSession::new("Rust", abcd_set(2));
        session.select(0).unwrap();
        session.advance().unwrap();
        session.select(0).unwrap();

        let navigation = question_keyboard(&session).inline_keyboard.pop().unwrap();
        let labels: Vec<_> = navigation.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(labels, vec!["⬅️ Previous", "Finish Quiz 🏁"]);
    }
}
