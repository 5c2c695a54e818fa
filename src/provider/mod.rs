use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{sort_by_difficulty, Question};

mod csv_bank;
mod http;
pub use csv_bank::*;
pub use http::*;

/// Source of quiz questions for a topic.
///
/// Implementations return questions in whatever order they like; callers go
/// through [`fetch_quiz`] to get a list a session can be built from.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<Vec<Question>, ProviderError>;

    /// Short name used in logs.
    fn source_name(&self) -> &'static str;
}

/// Asks `provider` for questions on `topic`, checks each one and returns them
/// sorted by difficulty. Errors are passed through untouched; nothing is retried.
pub async fn fetch_quiz(
    provider: &dyn QuestionProvider,
    topic: &str,
) -> Result<Vec<Question>, ProviderError> {
    let questions = provider.generate(topic).await?;
    log::info!(
        "{} returned {} questions for '{}'",
        provider.source_name(),
        questions.len(),
        topic
    );
    if questions.is_empty() {
        return Err(ProviderError::NoQuestions(topic.to_string()));
    }
    for (index, question) in questions.iter().enumerate() {
        question
            .validate()
            .map_err(|source| ProviderError::InvalidQuestion { index, source })?;
    }
    Ok(sort_by_difficulty(questions))
}
