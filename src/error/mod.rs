use thiserror::Error;

use crate::types::Difficulty;

/// Shape problems in a single question.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("question has no options")]
    NoOptions,
    #[error("option listed twice: {0}")]
    DuplicateOption(String),
    #[error("answer is not one of the options: {0}")]
    AnswerNotInOptions(String),
}

/// An operation was invoked against a session state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("session has already ended")]
    SessionEnded,
    #[error("not an option of the current question: {0}")]
    UnknownOption(String),
    #[error("a session needs at least one question")]
    NoQuestions,
    #[error("overall time budget must be positive")]
    NoTimeBudget,
    #[error("questions are not sorted by difficulty (at index {index})")]
    UnsortedQuestions { index: usize },
    #[error("question {index} is malformed: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Failure of the external question service.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("question service returned {code}: {detail}")]
    Status { code: u16, detail: String },
    #[error("could not decode questions: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no questions available for topic '{0}'")]
    NoQuestions(String),
    #[error("question {index} is malformed: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
    #[error("difficulty table has no entry for {0}")]
    MissingTier(Difficulty),
    #[error("difficulty table lists {0} twice")]
    DuplicateTier(Difficulty),
    #[error("difficulty {0} must have positive time and points")]
    NonPositiveTier(Difficulty),
}
