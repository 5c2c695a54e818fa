use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tokio::sync::Mutex;

use super::QuestionProvider;
use crate::difficulty::Curriculum;
use crate::error::ProviderError;
use crate::types::{Difficulty, Question};

#[derive(Debug, Clone, Deserialize)]
struct BankRow {
    topic: String,
    question: String,
    option1: String,
    option2: String,
    option3: String,
    option4: String,
    answer: String,
    difficulty: Difficulty,
}

impl BankRow {
    fn to_question(&self) -> Question {
        Question::new(
            self.question.clone(),
            vec![
                self.option1.clone(),
                self.option2.clone(),
                self.option3.clone(),
                self.option4.clone(),
            ],
            self.answer.clone(),
            self.difficulty,
        )
    }
}

/// Offline question bank read from CSV with the header
/// `topic,question,option1,option2,option3,option4,answer,difficulty`.
pub struct CsvQuestionProvider {
    rows: Vec<BankRow>,
    curriculum: Curriculum,
    rng: Mutex<StdRng>,
}

impl CsvQuestionProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let reader = csv::Reader::from_path(path)?;
        Self::collect(reader)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProviderError> {
        Self::collect(csv::Reader::from_reader(reader))
    }

    fn collect<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self, ProviderError> {
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let row: BankRow = result?;
            rows.push(row);
        }
        Ok(Self {
            rows,
            curriculum: Curriculum::STANDARD,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    pub fn with_curriculum(mut self, curriculum: Curriculum) -> Self {
        self.curriculum = curriculum;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl QuestionProvider for CsvQuestionProvider {
    async fn generate(&self, topic: &str) -> Result<Vec<Question>, ProviderError> {
        let topic = topic.trim().to_lowercase();
        let matching: Vec<&BankRow> = self
            .rows
            .iter()
            .filter(|row| row.topic.to_lowercase() == topic)
            .collect();

        let mut questions = Vec::new();
        let mut rng = self.rng.lock().await;
        for difficulty in Difficulty::ALL {
            let tier: Vec<&BankRow> = matching
                .iter()
                .copied()
                .filter(|row| row.difficulty == difficulty)
                .collect();
            let wanted = self.curriculum.count(difficulty) as usize;
            questions.extend(
                tier.choose_multiple(&mut *rng, wanted)
                    .map(|row| row.to_question()),
            );
        }

        if questions.is_empty() {
            return Err(ProviderError::NoQuestions(topic));
        }
        Ok(questions)
    }

    fn source_name(&self) -> &'static str {
        "csv"
    }
}
