use serde::Serialize;

use crate::session::{EndReason, QuizResult};

/// What the results screen shows.
///
/// `total_marks` comes from configuration, not from the number of questions
/// actually played, so accuracy is only meaningful when the provider
/// delivered the nominal mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultsSummary {
    pub score: u32,
    pub total_marks: u32,
    pub accuracy_percent: u32,
    pub time_remaining: u32,
    pub reason: EndReason,
}

impl ResultsSummary {
    pub fn new(result: QuizResult, total_marks: u32) -> Self {
        Self {
            score: result.final_score,
            total_marks,
            accuracy_percent: accuracy_percent(result.final_score, total_marks),
            time_remaining: result.final_overall_remaining,
            reason: result.reason,
        }
    }
}

/// Rounded percentage, 0 when there is nothing to score against.
pub fn accuracy_percent(score: u32, total_marks: u32) -> u32 {
    if total_marks == 0 {
        return 0;
    }
    (f64::from(score) / f64::from(total_marks) * 100.0).round() as u32
}

/// `4m 30s`
pub fn format_duration(seconds: u32) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// `04:30`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
