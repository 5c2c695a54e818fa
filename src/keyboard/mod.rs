use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::session::ActiveSnapshot;

/// What an inline button asks the quiz to do.
///
/// Buttons carry the epoch of the question they were drawn for, so a press
/// on an outdated message cannot touch a later question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAction {
    Select { epoch: u64, index: usize },
    Next { epoch: u64 },
    End,
}

impl QuizAction {
    pub fn parse(data: &str) -> Option<Self> {
        if data == "end_quiz" {
            return Some(QuizAction::End);
        }
        if let Some(epoch) = data.strip_prefix("next:") {
            return epoch.parse().ok().map(|epoch| QuizAction::Next { epoch });
        }
        let (epoch, index) = data.strip_prefix("opt:")?.split_once(':')?;
        Some(QuizAction::Select {
            epoch: epoch.parse().ok()?,
            index: index.parse().ok()?,
        })
    }

    pub fn callback_data(&self) -> String {
        match self {
            QuizAction::Select { epoch, index } => format!("opt:{}:{}", epoch, index),
            QuizAction::Next { epoch } => format!("next:{}", epoch),
            QuizAction::End => "end_quiz".to_string(),
        }
    }
}

pub fn create_keyboard(snapshot: &ActiveSnapshot) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = snapshot
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let text = if snapshot.selected_answer.as_deref() == Some(option.as_str()) {
                format!("👉 {}", option)
            } else {
                option.clone()
            };
            vec![InlineKeyboardButton::callback(
                text,
                QuizAction::Select {
                    epoch: snapshot.epoch,
                    index,
                }
                .callback_data(),
            )]
        })
        .collect();

    let next_label = if snapshot.is_last() { "🏁 Finish" } else { "➡️ Next" };
    keyboard.push(vec![
        InlineKeyboardButton::callback(
            next_label.to_string(),
            QuizAction::Next { epoch: snapshot.epoch }.callback_data(),
        ),
        InlineKeyboardButton::callback("🛑 End Quiz".to_string(), QuizAction::End.callback_data()),
    ]);

    InlineKeyboardMarkup::new(keyboard)
}
