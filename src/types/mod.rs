use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::QuestionError;

mod difficulty;
pub use difficulty::*;

/// A multiple-choice question as returned by the question service.
///
/// Immutable once received; `validate` checks the shape the session relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "answer")]
    pub correct_answer: String,
    pub difficulty: Difficulty,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            correct_answer: correct_answer.into(),
            difficulty,
        }
    }

    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }
        if !self.has_option(&self.correct_answer) {
            return Err(QuestionError::AnswerNotInOptions(self.correct_answer.clone()));
        }
        Ok(())
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// `None` never matches.
    pub fn is_correct(&self, answer: Option<&str>) -> bool {
        answer.map_or(false, |a| a == self.correct_answer)
    }
}

/// Stable sort by difficulty rank; same-tier questions keep provider order.
pub fn sort_by_difficulty(mut questions: Vec<Question>) -> Vec<Question> {
    questions.sort_by_key(|q| q.difficulty.rank());
    questions
}
