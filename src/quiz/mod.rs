use serde::Serialize;

pub mod bridge;
pub mod ledger;
pub mod scoring;
pub mod session;
pub mod validator;

/// A multiple-choice question. `correct_option_index` always points into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    #[serde(rename = "question")]
    text: String,
    options: Vec<String>,
    correct_option_index: usize,
}

/// Ordered, non-empty list of questions. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl Question {
    pub(crate) fn new(text: String, options: Vec<String>, correct_option_index: usize) -> Self {
        Self {
            text,
            options,
            correct_option_index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    pub fn correct_option_index(&self) -> usize {
        self.correct_option_index
    }

    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_option_index]
    }
}

impl QuestionSet {
    pub(crate) fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Canonical serialized form stored as an attempt's `questions_data`.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.questions)
    }
}

/// `A`, `B`, `C`, ... for option positions.
pub fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}
