use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::MessageId;
use tokio::sync::Mutex;

use crate::clock::SessionClock;
use crate::config::{Config, ProviderSource};
use crate::error::ProviderError;
use crate::provider::{CsvQuestionProvider, HttpQuestionProvider, QuestionProvider};
use crate::render::MessageGate;

/// A quiz running in one chat.
pub struct ActiveQuiz {
    pub topic: String,
    pub message_id: MessageId,
    pub started_at: DateTime<Utc>,
    pub clock: SessionClock,
    /// Shared with the clock's observer; every edit of `message_id` goes through it.
    pub gate: Arc<Mutex<MessageGate>>,
}

pub struct BotState {
    pub provider: Arc<dyn QuestionProvider>,
    pub config: Config,
    pub active_quizzes: Mutex<HashMap<i64, Arc<ActiveQuiz>>>,
}

impl BotState {
    pub fn new(provider: Arc<dyn QuestionProvider>, config: Config) -> Self {
        Self {
            provider,
            config,
            active_quizzes: Mutex::new(HashMap::new()),
        }
    }

    pub async fn active_quiz(&self, chat_id: i64) -> Option<Arc<ActiveQuiz>> {
        self.active_quizzes.lock().await.get(&chat_id).cloned()
    }

    /// Registers `quiz` for the chat. A quiz it replaces is returned; dropping
    /// it stops its clock.
    pub async fn insert_quiz(&self, chat_id: i64, quiz: ActiveQuiz) -> Option<Arc<ActiveQuiz>> {
        self.active_quizzes.lock().await.insert(chat_id, Arc::new(quiz))
    }

    /// Removes the chat's quiz, but only if it is still the one shown in
    /// `message_id`. Stale callbacks for a replaced quiz leave the new one alone.
    pub async fn finish_quiz(&self, chat_id: i64, message_id: MessageId) -> Option<Arc<ActiveQuiz>> {
        let mut quizzes = self.active_quizzes.lock().await;
        match quizzes.get(&chat_id) {
            Some(quiz) if quiz.message_id == message_id => quizzes.remove(&chat_id),
            _ => None,
        }
    }

    pub async fn remove_quiz(&self, chat_id: i64) -> Option<Arc<ActiveQuiz>> {
        self.active_quizzes.lock().await.remove(&chat_id)
    }
}

/// Builds the question provider named by the configuration.
pub fn build_provider(config: &Config) -> Result<Arc<dyn QuestionProvider>, ProviderError> {
    match &config.provider {
        ProviderSource::Http { url, timeout } => {
            log::info!("Using question service at {}", url);
            Ok(Arc::new(HttpQuestionProvider::new(url.clone(), *timeout)?))
        }
        ProviderSource::Csv { path } => {
            let bank = CsvQuestionProvider::from_path(path)?;
            log::info!("Loaded {} questions from {}", bank.len(), path.display());
            Ok(Arc::new(bank))
        }
    }
}
