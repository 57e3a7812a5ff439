use super::{ledger::AnswerLedger, QuestionSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_index: usize,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Derived from a ledger and its question set; never stored as primary state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: usize,
    pub total: usize,
    pub per_question: Vec<QuestionOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Perfect,
    Good,
    Average,
    Low,
}

/// Unanswered questions count as incorrect.
pub fn score(questions: &QuestionSet, ledger: &AnswerLedger) -> ScoreResult {
    let per_question: Vec<QuestionOutcome> = questions
        .iter()
        .enumerate()
        .map(|(question_index, question)| {
            let user_answer = ledger.get(question_index);
            let correct_answer = question.correct_answer();
            QuestionOutcome {
                question_index,
                user_answer: user_answer.map(str::to_string),
                correct_answer: correct_answer.to_string(),
                is_correct: user_answer == Some(correct_answer),
            }
        })
        .collect();

    ScoreResult {
        score: per_question.iter().filter(|o| o.is_correct).count(),
        total: questions.len(),
        per_question,
    }
}

impl ScoreResult {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.score as f64 / self.total as f64
        }
    }

    pub fn percentage(&self) -> f64 {
        self.ratio() * 100.0
    }

    pub fn rounded_percentage(&self) -> u32 {
        self.percentage().round() as u32
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_percentage(self.percentage())
    }
}

impl ScoreBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            ScoreBand::Perfect
        } else if percentage >= 80.0 {
            ScoreBand::Good
        } else if percentage >= 60.0 {
            ScoreBand::Average
        } else {
            ScoreBand::Low
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScoreBand::Perfect => "🎉 Perfect Score! Excellent work!",
            ScoreBand::Good => "👏 Great job! You did very well!",
            ScoreBand::Average => "👍 Good effort! Keep practicing!",
            ScoreBand::Low => "📚 Keep studying! You'll do better next time!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::tests::abcd_set;

    #[test]
    fn scores_against_correct_option() {
        let questions = abcd_set(3);
        let mut ledger = AnswerLedger::new(3);
        ledger.select(0, "C").unwrap();
        ledger.select(1, "A").unwrap();
        ledger.select(2, "C").unwrap();

        let result = score(&questions, &ledger);

        assert_eq!(result.score, 2);
        assert_eq!(result.total, 3);
        assert!(!result.per_question[1].is_correct);
        assert_eq!(result.per_question[1].user_answer.as_deref(), Some("A"));
        assert_eq!(result.per_question[1].correct_answer, "C");
    }

    #[test]
    fn unanswered_questions_are_incorrect() {
        let questions = abcd_set(2);
        let mut ledger = AnswerLedger::new(2);
        ledger.select(1, "C").unwrap();

        let result = score(&questions, &ledger);

        assert_eq!(result.score, 1);
        assert_eq!(result.per_question[0].user_answer, None);
        assert!(!result.per_question[0].is_correct);
    }

    #[test]
    fn score_matches_count_of_correct_entries() {
        let questions = abcd_set(5);
        let mut ledger = AnswerLedger::new(5);
        for (i, answer) in ["C", "B", "C", "D", "C"].iter().enumerate() {
            ledger.select(i, *answer).unwrap();
        }

        let expected = (0..questions.len())
            .filter(|i| ledger.get(*i) == Some(questions.get(*i).unwrap().correct_answer()))
            .count();
        assert_eq!(score(&questions, &ledger).score, expected);
    }

    #[test]
    fn bands_are_exclusive() {
        assert_eq!(ScoreBand::from_percentage(100.0), ScoreBand::Perfect);
        assert_eq!(ScoreBand::from_percentage(80.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percentage(99.9), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percentage(60.0), ScoreBand::Average);
        assert_eq!(ScoreBand::from_percentage(59.9), ScoreBand::Low);
    }

    #[test]
    fn rounds_percentage() {
        let questions = abcd_set(3);
        let mut ledger = AnswerLedger::new(3);
        ledger.select(0, "C").unwrap();
        ledger.select(1, "C").unwrap();

        let result = score(&questions, &ledger);
        assert_eq!(result.rounded_percentage(), 67);
        assert_eq!(result.band(), ScoreBand::Average);
    }
}
