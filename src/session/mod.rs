use serde::Serialize;

use crate::difficulty::DifficultyPolicy;
use crate::error::UsageError;
use crate::types::{Difficulty, Question};

/// Overall time budget of a quiz, in seconds.
pub const OVERALL_SECONDS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// The last question was answered or timed out.
    Completed,
    /// The overall clock ran out.
    OverallTimeout,
}

/// Terminal outcome handed back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub final_score: u32,
    pub final_overall_remaining: u32,
    pub reason: EndReason,
}

/// What a single operation did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Time elapsed; still on the same question.
    Ticked,
    /// Moved on to question `index`. `credited` is what the previous question earned.
    Advanced { index: usize, epoch: u64, credited: u32 },
    Ended(QuizResult),
    /// Question tick from an earlier epoch; nothing changed.
    Stale,
}

impl Transition {
    pub fn is_ended(&self) -> bool {
        matches!(self, Transition::Ended(_))
    }
}

/// How much of the current question's allotment is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerLevel {
    /// More than half.
    Plenty,
    /// More than a quarter.
    Low,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSnapshot {
    pub prompt: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub index: usize,
    pub total: usize,
    pub score: u32,
    pub overall_remaining: u32,
    pub question_remaining: u32,
    pub allotted_seconds: u32,
    pub selected_answer: Option<String>,
    pub epoch: u64,
}

impl ActiveSnapshot {
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    pub fn timer_level(&self) -> TimerLevel {
        if self.question_remaining * 2 > self.allotted_seconds {
            TimerLevel::Plenty
        } else if self.question_remaining * 4 > self.allotted_seconds {
            TimerLevel::Low
        } else {
            TimerLevel::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSnapshot {
    Active(ActiveSnapshot),
    Ended(QuizResult),
}

/// One run through an ordered list of questions under two countdowns.
///
/// The session never reads a clock. The host delivers one tick per elapsed
/// second through [`tick_overall`](Self::tick_overall) and
/// [`tick_question_for`](Self::tick_question_for) (or the combined
/// [`tick`](Self::tick)), serially. Every change of question bumps the epoch;
/// question ticks tagged with an older epoch are discarded.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    policy: DifficultyPolicy,
    current_index: usize,
    selected_answer: Option<String>,
    score: u32,
    overall_remaining: u32,
    question_remaining: u32,
    epoch: u64,
    result: Option<QuizResult>,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>, policy: DifficultyPolicy) -> Result<Self, UsageError> {
        Self::with_overall_budget(questions, policy, OVERALL_SECONDS)
    }

    /// `questions` must already be sorted by difficulty
    /// (see [`sort_by_difficulty`](crate::sort_by_difficulty)).
    pub fn with_overall_budget(
        questions: Vec<Question>,
        policy: DifficultyPolicy,
        overall_seconds: u32,
    ) -> Result<Self, UsageError> {
        if questions.is_empty() {
            return Err(UsageError::NoQuestions);
        }
        if overall_seconds == 0 {
            return Err(UsageError::NoTimeBudget);
        }
        for (index, question) in questions.iter().enumerate() {
            question
                .validate()
                .map_err(|source| UsageError::InvalidQuestion { index, source })?;
        }
        if let Some(index) = questions
            .windows(2)
            .position(|pair| pair[0].difficulty.rank() > pair[1].difficulty.rank())
        {
            return Err(UsageError::UnsortedQuestions { index: index + 1 });
        }

        let question_remaining = policy.allotted_seconds(questions[0].difficulty);
        Ok(Self {
            questions,
            policy,
            current_index: 0,
            selected_answer: None,
            score: 0,
            overall_remaining: overall_seconds,
            question_remaining,
            epoch: 0,
            result: None,
        })
    }

    /// Stores the pending choice for the current question. No scoring happens here.
    pub fn select_answer(&mut self, option: &str) -> Result<(), UsageError> {
        self.ensure_active()?;
        if !self.questions[self.current_index].has_option(option) {
            return Err(UsageError::UnknownOption(option.to_string()));
        }
        self.selected_answer = Some(option.to_string());
        Ok(())
    }

    /// Scores the pending choice and moves to the next question, or ends the
    /// session after the last one.
    pub fn advance(&mut self) -> Result<Transition, UsageError> {
        self.ensure_active()?;
        Ok(self.step())
    }

    /// One second off the overall clock. Reaching zero ends the session with
    /// the score accumulated so far, whatever question is on screen.
    ///
    /// Ticking a session whose overall clock is already at zero only reports
    /// the result again.
    pub fn tick_overall(&mut self) -> Result<Transition, UsageError> {
        if let Some(result) = self.result {
            return if self.overall_remaining == 0 {
                Ok(Transition::Ended(result))
            } else {
                Err(UsageError::SessionEnded)
            };
        }
        self.overall_remaining = self.overall_remaining.saturating_sub(1);
        if self.overall_remaining == 0 {
            log::debug!("overall clock expired at question {}", self.current_index);
            return Ok(self.finish(EndReason::OverallTimeout));
        }
        Ok(Transition::Ticked)
    }

    /// One second off the current question's clock.
    pub fn tick_question(&mut self) -> Result<Transition, UsageError> {
        self.tick_question_for(self.epoch)
    }

    /// Question tick scheduled during `epoch`. Reaching zero behaves like
    /// [`advance`](Self::advance) with whatever answer is pending.
    pub fn tick_question_for(&mut self, epoch: u64) -> Result<Transition, UsageError> {
        self.ensure_active()?;
        if epoch != self.epoch {
            log::debug!("discarding question tick from epoch {} (now {})", epoch, self.epoch);
            return Ok(Transition::Stale);
        }
        self.question_remaining = self.question_remaining.saturating_sub(1);
        if self.question_remaining == 0 {
            log::debug!("question {} timed out", self.current_index);
            return Ok(self.step());
        }
        Ok(Transition::Ticked)
    }

    /// A full second on both clocks. The overall clock goes first, so when both
    /// run out together the session ends without scoring the open question.
    pub fn tick(&mut self) -> Result<Transition, UsageError> {
        self.ensure_active()?;
        match self.tick_overall()? {
            Transition::Ended(result) => Ok(Transition::Ended(result)),
            _ => self.tick_question(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        if let Some(result) = self.result {
            return SessionSnapshot::Ended(result);
        }
        let question = &self.questions[self.current_index];
        SessionSnapshot::Active(ActiveSnapshot {
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            difficulty: question.difficulty,
            index: self.current_index,
            total: self.questions.len(),
            score: self.score,
            overall_remaining: self.overall_remaining,
            question_remaining: self.question_remaining,
            allotted_seconds: self.policy.allotted_seconds(question.difficulty),
            selected_answer: self.selected_answer.clone(),
            epoch: self.epoch,
        })
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn overall_remaining(&self) -> u32 {
        self.overall_remaining
    }

    pub fn question_remaining(&self) -> u32 {
        self.question_remaining
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_ended(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<QuizResult> {
        self.result
    }

    fn ensure_active(&self) -> Result<(), UsageError> {
        if self.result.is_some() {
            return Err(UsageError::SessionEnded);
        }
        Ok(())
    }

    fn step(&mut self) -> Transition {
        let credited = {
            let question = &self.questions[self.current_index];
            if question.is_correct(self.selected_answer.as_deref()) {
                self.policy.points(question.difficulty)
            } else {
                0
            }
        };
        self.score += credited;
        self.selected_answer = None;

        if self.current_index + 1 == self.questions.len() {
            return self.finish(EndReason::Completed);
        }

        self.current_index += 1;
        self.epoch += 1;
        self.question_remaining = self
            .policy
            .allotted_seconds(self.questions[self.current_index].difficulty);
        Transition::Advanced {
            index: self.current_index,
            epoch: self.epoch,
            credited,
        }
    }

    fn finish(&mut self, reason: EndReason) -> Transition {
        let result = QuizResult {
            final_score: self.score,
            final_overall_remaining: self.overall_remaining,
            reason,
        };
        self.result = Some(result);
        Transition::Ended(result)
    }
}
