use std::error::Error;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::sync::Mutex;

use crate::keyboard::create_keyboard;
use crate::render::{render_question, render_results, MessageGate};
use crate::session::{ActiveSnapshot, QuizResult};
use crate::summary::ResultsSummary;

mod callback;
mod command;
mod timer;

pub use callback::*;
pub use command::*;
pub use timer::*;

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

// Edit failures are logged only: "message is not modified" is routine here.
// The gate stays locked across each edit so edits land in the order admitted.
pub(crate) async fn show_question(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    gate: &Mutex<MessageGate>,
    snapshot: &ActiveSnapshot,
) {
    let mut gate = gate.lock().await;
    if !gate.admit_question(snapshot) {
        return;
    }
    if let Err(e) = bot
        .edit_message_text(chat_id, message_id, render_question(snapshot))
        .reply_markup(create_keyboard(snapshot))
        .await
    {
        log::warn!("Failed to redraw quiz in chat {}: {}", chat_id, e);
    }
}

pub(crate) async fn show_results(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    gate: &Mutex<MessageGate>,
    result: QuizResult,
    total_marks: u32,
) {
    let summary = ResultsSummary::new(result, total_marks);
    close_message(bot, chat_id, message_id, gate, render_results(&summary)).await;
}

/// Replaces the quiz with `text` for good. Only the first close is shown.
pub(crate) async fn close_message(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    gate: &Mutex<MessageGate>,
    text: String,
) {
    let mut gate = gate.lock().await;
    if !gate.admit_close() {
        return;
    }
    if let Err(e) = bot.edit_message_text(chat_id, message_id, text).await {
        log::warn!("Failed to close quiz in chat {}: {}", chat_id, e);
    }
}
