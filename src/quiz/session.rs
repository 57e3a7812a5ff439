use crate::error::SessionError;

use super::{
    ledger::AnswerLedger,
    scoring::{score, ScoreResult},
    Question, QuestionSet,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Active { current: usize },
    /// Terminal. A retake goes through [`QuizSession::reset`].
    Reviewing { result: ScoreResult },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved(usize),
    Completed(ScoreResult),
}

/// One user's pass through a question set.
#[derive(Debug, Clone)]
pub struct QuizSession {
    topic: String,
    questions: QuestionSet,
    ledger: AnswerLedger,
    phase: Phase,
}

impl QuizSession {
    pub fn new(topic: impl Into<String>, questions: QuestionSet) -> Self {
        let ledger = AnswerLedger::new(questions.len());
        Self {
            topic: topic.into(),
            questions,
            ledger,
            phase: Phase::Active { current: 0 },
        }
    }

    /// Starts at the first question with answers carried over from an earlier attempt.
    pub fn with_ledger(
        topic: impl Into<String>,
        questions: QuestionSet,
        previous: &AnswerLedger,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(topic, questions);
        for (index, option) in previous.iter() {
            session.ledger.select(index, option)?;
        }
        Ok(session)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            Phase::Active { current } => Some(current),
            Phase::Reviewing { .. } => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.ledger.is_answered(index)
    }

    /// Position of the option chosen for the current question, if any.
    pub fn selected_option(&self) -> Option<usize> {
        let index = self.current_index()?;
        let answer = self.ledger.get(index)?;
        self.questions.get(index)?.options().iter().position(|o| o == answer)
    }

    /// `(current_index + 1) / total`; only defined while active.
    pub fn progress(&self) -> Option<f64> {
        self.current_index()
            .map(|current| (current + 1) as f64 / self.total() as f64)
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        match &self.phase {
            Phase::Reviewing { result } => Some(result),
            Phase::Active { .. } => None,
        }
    }

    /// Records the option at `option` for the current question.
    pub fn select(&mut self, option: usize) -> Result<&str, SessionError> {
        let current = self.current_index().ok_or(SessionError::NotActive)?;
        let question = self
            .questions
            .get(current)
            .ok_or(SessionError::IndexOutOfRange {
                index: current,
                total: self.questions.len(),
            })?;
        let text = question
            .option(option)
            .ok_or(SessionError::OptionOutOfRange {
                option,
                total: question.options().len(),
            })?;
        self.ledger.select(current, text)?;
        Ok(text)
    }

    pub fn advance(&mut self) -> Result<Transition, SessionError> {
        let current = self.current_index().ok_or(SessionError::NotActive)?;
        if !self.ledger.is_answered(current) {
            tracing::warn!(question = current, "advance rejected: question unanswered");
            return Err(SessionError::Unanswered(current));
        }

        if current + 1 < self.total() {
            self.phase = Phase::Active {
                current: current + 1,
            };
            Ok(Transition::Moved(current + 1))
        } else {
            let result = score(&self.questions, &self.ledger);
            self.phase = Phase::Reviewing {
                result: result.clone(),
            };
            Ok(Transition::Completed(result))
        }
    }

    pub fn retreat(&mut self) -> Result<usize, SessionError> {
        let current = self.current_index().ok_or(SessionError::NotActive)?;
        if current == 0 {
            tracing::warn!("retreat rejected: already at the first question");
            return Err(SessionError::AtFirstQuestion);
        }
        self.phase = Phase::Active {
            current: current - 1,
        };
        Ok(current - 1)
    }

    /// Retake: back to the first question with an empty ledger.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.result().is_none() {
            return Err(SessionError::NotReviewing);
        }
        self.ledger.clear();
        self.phase = Phase::Active { current: 0 };
        Ok(())
    }
}
