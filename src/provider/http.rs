use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::QuestionProvider;
use crate::error::ProviderError;
use crate::types::Question;

pub const DEFAULT_PROVIDER_URL: &str = "http://localhost:8000/api/generate-quiz";

#[derive(Serialize)]
struct QuizRequest<'a> {
    topic: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Question service reached over HTTP: `POST {"topic": ...}` answered with a
/// JSON array of questions.
pub struct HttpQuestionProvider {
    client: Client,
    url: String,
}

impl HttpQuestionProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl QuestionProvider for HttpQuestionProvider {
    async fn generate(&self, topic: &str) -> Result<Vec<Question>, ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .json(&QuizRequest { topic })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(status, &body)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Turns a question service reply into questions. A non-success status becomes
/// [`ProviderError::Status`] carrying the service's `detail`.
pub fn parse_response(status: StatusCode, body: &str) -> Result<Vec<Question>, ProviderError> {
    if !status.is_success() {
        return Err(ProviderError::Status {
            code: status.as_u16(),
            detail: error_detail(body),
        });
    }
    let questions: Vec<Question> = serde_json::from_str(body)?;
    Ok(questions.into_iter().map(repair_answer).collect())
}

/// The `detail` field of an error body, if the service sent one.
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .unwrap_or_else(|| "Failed to fetch quiz questions".to_string())
}

/// Generated questions sometimes name an answer that is not among the options.
/// The first option is replaced with the answer in that case.
pub fn repair_answer(mut question: Question) -> Question {
    if !question.has_option(&question.correct_answer) {
        if let Some(first) = question.options.first_mut() {
            log::warn!(
                "answer '{}' missing from options of '{}', replacing first option",
                question.correct_answer,
                question.prompt
            );
            *first = question.correct_answer.clone();
        }
    }
    question
}
