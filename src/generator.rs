use std::{future::Future, time::Duration};

use serde::Deserialize;
use serde_json::json;

use crate::{
    error::GenerationError,
    quiz::validator::{QuestionPayload, RawQuestions},
};

pub const MAX_QUESTIONS: u8 = 20;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Produces raw question data for the validator.
pub trait GenerateQuestions {
    fn generate(
        &self,
        topic: &str,
        count: u8,
    ) -> impl Future<Output = Result<RawQuestions, GenerationError>> + Send;
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: &str) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{GEMINI_BASE_URL}/{model}:generateContent"),
        })
    }

    async fn generate_content(&self, prompt: String) -> Result<String, GenerationError> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response: GenerateContentResponse = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| GenerationError::UnexpectedResponse("no candidate text".into()))
    }
}

impl GenerateQuestions for GeminiClient {
    async fn generate(&self, topic: &str, count: u8) -> Result<RawQuestions, GenerationError> {
        let topic = check_request(topic, count)?;

        tracing::info!("Generating {} questions about '{}'", count, topic);
        let text = self.generate_content(prompt(topic, count)).await?;
        let payload: QuestionPayload = serde_json::from_str(extract_json(&text))?;

        Ok(RawQuestions::Decoded(payload))
    }
}

/// Returns the trimmed topic when the request is acceptable.
pub fn check_request(topic: &str, count: u8) -> Result<&str, GenerationError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(GenerationError::EmptyTopic);
    }
    if !(1..=MAX_QUESTIONS).contains(&count) {
        return Err(GenerationError::CountOutOfRange(count));
    }
    Ok(topic)
}

fn prompt(topic: &str, count: u8) -> String {
    format!(
        r#"Generate {count} multiple choice questions about {topic}.
Each question should have 4 options (A, B, C, D).
Format the response as valid JSON with this exact structure:
{{
  "questions": [
    {{
      "question": "Question text here?",
      "options": ["Option A", "Option B", "Option C", "Option D"]
    }}
  ],
  "answers": [
    "Correct option text for question 1",
    "Correct option text for question 2"
  ]
}}

Make sure the questions are educational and the options are plausible but only one is correct.
Each entry of "answers" must repeat the correct option text exactly.
Topic: {topic}
Number of questions: {count}"#
    )
}

/// Strips Markdown fences and surrounding prose from a model reply.
pub(crate) fn extract_json(response: &str) -> &str {
    let mut body = response.trim();

    if let Some(start) = body.find("```json") {
        body = fenced(&body[start + "```json".len()..]);
    } else if let Some(start) = body.find("```") {
        body = fenced(&body[start + "```".len()..]);
    }

    if body.starts_with('[') {
        return body;
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

fn fenced(after_open: &str) -> &str {
    match after_open.find("```") {
        Some(end) => after_open[..end].trim(),
        None => after_open.trim(),
    }
}
