//! Canonicalizes raw question payloads into a [`QuestionSet`].
//!
//! Every accepted input shape is listed in [`RawQuestions`] and
//! [`QuestionPayload`]; anything else is rejected with a [`ValidationError`].

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;

use super::{option_letter, Question, QuestionSet};

/// Correct option assumed when neither the question nor its payload names one.
pub const LEGACY_CORRECT_OPTION: usize = 2;

const NULL_SENTINELS: [&str; 2] = ["undefined", "null"];

/// Raw input to [`validate`]: either a string-encoded blob or an already decoded payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawQuestions {
    Encoded(String),
    Decoded(QuestionPayload),
}

/// Decoded question data, as stored in attempts or returned by the generator.
///
/// Elements stay untyped here so a bad element is reported with its index.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionPayload {
    /// `[{"question": ..., "options": [...]}, ...]`
    List(Vec<Value>),
    /// `{"questions": [...], "answers": ["correct option text", ...]}`
    Envelope {
        questions: Vec<Value>,
        #[serde(default)]
        answers: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default, rename = "question", alias = "text")]
    text: Option<String>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default, alias = "correctOptionIndex")]
    correct_option_index: Option<usize>,
    #[serde(default)]
    answer: Option<String>,
}

pub fn validate(raw: RawQuestions) -> Result<QuestionSet, ValidationError> {
    let payload = match raw {
        RawQuestions::Encoded(blob) => decode_blob(&blob)?,
        RawQuestions::Decoded(payload) => payload,
    };
    canonicalize(payload)
}

pub fn validate_blob(blob: &str) -> Result<QuestionSet, ValidationError> {
    validate(RawQuestions::Encoded(blob.to_string()))
}

fn decode_blob(blob: &str) -> Result<QuestionPayload, ValidationError> {
    let blob = blob.trim();
    if blob.is_empty() {
        return Err(ValidationError::MalformedBlob("blob is empty".into()));
    }
    if NULL_SENTINELS.contains(&blob) {
        return Err(ValidationError::MalformedBlob(format!(
            "blob is the '{blob}' sentinel"
        )));
    }
    serde_json::from_str(blob).map_err(|err| ValidationError::MalformedBlob(err.to_string()))
}

fn canonicalize(payload: QuestionPayload) -> Result<QuestionSet, ValidationError> {
    let (raw_questions, answers) = match payload {
        QuestionPayload::List(questions) => (questions, Vec::new()),
        QuestionPayload::Envelope { questions, answers } => (questions, answers),
    };
    if raw_questions.is_empty() {
        return Err(ValidationError::Empty);
    }

    let questions = raw_questions
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let raw: RawQuestion = serde_json::from_value(element).map_err(|err| {
                ValidationError::InvalidQuestion {
                    index,
                    reason: err.to_string(),
                }
            })?;
            raw.into_question(index, answers.get(index).map(String::as_str))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QuestionSet::new(questions))
}

impl RawQuestion {
    fn into_question(
        self,
        index: usize,
        envelope_answer: Option<&str>,
    ) -> Result<Question, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidQuestion { index, reason };

        let text = match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => return Err(invalid("missing question text".into())),
        };

        let options = self
            .options
            .ok_or_else(|| invalid("missing options".into()))?;
        if options.len() < 2 {
            return Err(invalid(format!(
                "needs at least 2 options, got {}",
                options.len()
            )));
        }
        if let Some(blank) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(invalid(format!("option {} is empty", option_letter(blank))));
        }

        let correct = match (
            self.correct_option_index,
            self.answer.as_deref().or(envelope_answer),
        ) {
            (Some(correct), _) => correct,
            (None, Some(answer)) => answer_position(&options, answer)
                .ok_or_else(|| invalid(format!("answer '{answer}' is not one of the options")))?,
            (None, None) => LEGACY_CORRECT_OPTION,
        };
        if correct >= options.len() {
            return Err(invalid(format!(
                "correct option {correct} is out of range ({} options)",
                options.len()
            )));
        }

        Ok(Question::new(text, options, correct))
    }
}

/// Matches an answer by option text, or by a bare option letter (`"C"`).
fn answer_position(options: &[String], answer: &str) -> Option<usize> {
    let answer = answer.trim();
    options
        .iter()
        .position(|option| option.trim() == answer)
        .or_else(|| {
            let mut chars = answer.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) if letter.is_ascii_alphabetic() => {
                    let index = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
                    (index < options.len()).then_some(index)
                }
                _ => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_index(result: Result<QuestionSet, ValidationError>) -> usize {
        match result {
            Err(ValidationError::InvalidQuestion { index, .. }) => index,
            other => panic!("expected InvalidQuestion, got {other:?}"),
        }
    }

    #[test]
    fn accepts_stored_blob_shape() {
        let set = validate_blob(
            r#"[{"question":"2+2?","options":["1","2","4","5"]},
                {"question":"Capital of France?","options":["Rome","Oslo","Paris","Bern"]}]"#,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().text(), "2+2?");
        assert_eq!(set.get(1).unwrap().correct_answer(), "Paris");
    }

    #[test]
    fn rejects_empty_and_sentinel_blobs() {
        for blob in ["", "   ", "undefined", "null"] {
            assert!(
                matches!(validate_blob(blob), Err(ValidationError::MalformedBlob(_))),
                "blob {blob:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_undecodable_blob() {
        assert!(matches!(
            validate_blob("{not json"),
            Err(ValidationError::MalformedBlob(_))
        ));
        assert!(matches!(
            validate_blob("42"),
            Err(ValidationError::MalformedBlob(_))
        ));
    }

    #[test]
    fn rejects_double_encoded_blob() {
        let inner = r#"[{"question":"Q","options":["a","b","c"]}]"#;
        let double = serde_json::to_string(inner).unwrap();
        assert!(matches!(
            validate_blob(&double),
            Err(ValidationError::MalformedBlob(_))
        ));
    }

    #[test]
    fn empty_sequence_is_reported_as_empty() {
        assert_eq!(validate_blob("[]"), Err(ValidationError::Empty));
        assert_eq!(
            validate_blob(r#"{"questions": []}"#),
            Err(ValidationError::Empty)
        );
    }

    #[test]
    fn reports_index_of_invalid_question() {
        let blob = r#"[{"question":"ok","options":["a","b","c"]},
                       {"question":"   ","options":["a","b","c"]}]"#;
        assert_eq!(invalid_index(validate_blob(blob)), 1);

        let blob = r#"[{"question":"one option","options":["a"]}]"#;
        assert_eq!(invalid_index(validate_blob(blob)), 0);

        let blob = r#"[{"question":"no options"}]"#;
        assert_eq!(invalid_index(validate_blob(blob)), 0);
    }

    #[test]
    fn mistyped_element_keeps_its_index() {
        for bad in [
            r#"{"question":"bad","options":"abc"}"#,
            r#"{"question":7,"options":["a","b","c"]}"#,
            "5",
            r#"{"question":"bad","options":["a","b","c"],"correct_option_index":-1}"#,
        ] {
            let blob = format!(r#"[{{"question":"ok","options":["a","b","c"]}},{bad}]"#);
            assert_eq!(invalid_index(validate_blob(&blob)), 1, "element {bad}");
        }

        let envelope = r#"{"questions":[{"question":"bad","options":"abc"}],"answers":["a"]}"#;
        assert_eq!(invalid_index(validate_blob(envelope)), 0);
    }

    #[test]
    fn explicit_index_out_of_range_is_invalid() {
        let blob = r#"[{"question":"Q","options":["a","b"],"correct_option_index":9}]"#;
        assert_eq!(invalid_index(validate_blob(blob)), 0);
    }

    #[test]
    fn legacy_index_must_exist() {
        let blob = r#"[{"question":"two options","options":["yes","no"]}]"#;
        assert_eq!(invalid_index(validate_blob(blob)), 0);
    }

    #[test]
    fn explicit_index_wins_over_answers() {
        let blob = r#"{"questions":[{"question":"Q","options":["a","b","c"],"correct_option_index":0}],
                       "answers":["b"]}"#;
        let set = validate_blob(blob).unwrap();
        assert_eq!(set.get(0).unwrap().correct_option_index(), 0);
    }

    #[test]
    fn envelope_answers_resolve_correct_option() {
        let blob = r#"{"questions":[{"question":"Q1","options":["a","b"]},
                                    {"question":"Q2","options":["x","y","z"]}],
                       "answers":["b","C"]}"#;
        let set = validate_blob(blob).unwrap();
        assert_eq!(set.get(0).unwrap().correct_answer(), "b");
        assert_eq!(set.get(1).unwrap().correct_answer(), "z");
    }

    #[test]
    fn unknown_answer_is_invalid() {
        let blob = r#"[{"question":"Q","options":["a","b"],"answer":"nope"}]"#;
        assert_eq!(invalid_index(validate_blob(blob)), 0);
    }

    #[test]
    fn canonical_blob_validates_to_same_set() {
        let set = validate_blob(r#"[{"text":"Q","options":["a","b","c","d"],"answer":"d"}]"#)
            .unwrap();
        let again = validate_blob(&set.to_blob().unwrap()).unwrap();
        assert_eq!(set, again);
    }

    #[test]
    fn decoded_payload_skips_blob_decoding() {
        let payload: QuestionPayload =
            serde_json::from_str(r#"[{"question":"Q","options":["a","b","c"]}]"#).unwrap();
        let set = validate(RawQuestions::Decoded(payload)).unwrap();
        assert_eq!(set.get(0).unwrap().correct_answer(), "c");
    }
}
