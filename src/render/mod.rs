use chrono::{DateTime, Utc};

use crate::clock::TickSource;
use crate::session::{ActiveSnapshot, EndReason, TimerLevel};
use crate::summary::{format_clock, format_duration, ResultsSummary};

const BAR_CELLS: u32 = 10;

/// Ten-cell bar of the question time left, coloured by how much is left.
pub fn timer_bar(snapshot: &ActiveSnapshot) -> String {
    let allotted = snapshot.allotted_seconds.max(1);
    let filled = (snapshot.question_remaining * BAR_CELLS + allotted - 1) / allotted;
    let filled = filled.min(BAR_CELLS);
    let cell = match snapshot.timer_level() {
        TimerLevel::Plenty => "🟩",
        TimerLevel::Low => "🟨",
        TimerLevel::Critical => "🟥",
    };
    format!(
        "{}{}",
        cell.repeat(filled as usize),
        "⬜".repeat((BAR_CELLS - filled) as usize)
    )
}

pub fn render_question(snapshot: &ActiveSnapshot) -> String {
    format!(
        "{} {}    ⏱ {}    Score: {}\n{} {}s\n\nQuestion {} of {}\n{}",
        snapshot.difficulty.badge(),
        snapshot.difficulty,
        format_clock(snapshot.overall_remaining),
        snapshot.score,
        timer_bar(snapshot),
        snapshot.question_remaining,
        snapshot.index + 1,
        snapshot.total,
        snapshot.prompt
    )
}

pub fn render_results(summary: &ResultsSummary) -> String {
    let headline = match summary.reason {
        EndReason::Completed => "🏆 Quiz Complete!",
        EndReason::OverallTimeout => "⌛ Time's up! Quiz Complete!",
    };
    format!(
        "{}\n\nTotal score: {} / {}\nAccuracy: {}%\nTime remaining: {}\n\nUse /quiz <topic> to play again.",
        headline,
        summary.score,
        summary.total_marks,
        summary.accuracy_percent,
        format_duration(summary.time_remaining)
    )
}

pub fn render_status(topic: &str, started_at: DateTime<Utc>, snapshot: &ActiveSnapshot) -> String {
    format!(
        "Quiz on \"{}\" started {}\nQuestion {} of {}, score {}, {} left overall",
        topic,
        started_at.format("%H:%M:%S UTC"),
        snapshot.index + 1,
        snapshot.total,
        snapshot.score,
        format_clock(snapshot.overall_remaining)
    )
}

/// Clock-driven redraws happen every fifth second of the overall clock;
/// Telegram rate-limits message edits. Question ticks never redraw, so a
/// qualifying second is drawn once.
pub fn should_refresh(source: TickSource, snapshot: &ActiveSnapshot) -> bool {
    source == TickSource::Overall && snapshot.overall_remaining % 5 == 0
}

/// Decides which edits of one quiz message still apply.
///
/// Edits come from button presses and from the clock at the same time. Once
/// the message has been closed (results or a stop notice), nothing redraws
/// the question over it, and a question view never replaces a later one.
#[derive(Debug, Default)]
pub struct MessageGate {
    closed: bool,
    epoch: u64,
}

impl MessageGate {
    pub fn admit_question(&mut self, snapshot: &ActiveSnapshot) -> bool {
        if self.closed || snapshot.epoch < self.epoch {
            return false;
        }
        self.epoch = snapshot.epoch;
        true
    }

    /// True only for the first close.
    pub fn admit_close(&mut self) -> bool {
        !std::mem::replace(&mut self.closed, true)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
