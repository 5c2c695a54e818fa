use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::sync::Mutex;

use super::{show_question, show_results};
use crate::clock::{SessionObserver, TickSource};
use crate::render::{should_refresh, MessageGate};
use crate::session::{ActiveSnapshot, SessionSnapshot, Transition};
use crate::state::BotState;

/// Reflects clock-driven transitions in the chat's quiz message.
pub struct TelegramObserver {
    pub bot: Bot,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub gate: Arc<Mutex<MessageGate>>,
    pub state: Arc<BotState>,
}

impl TelegramObserver {
    async fn redraw(&self, snapshot: &ActiveSnapshot) {
        show_question(&self.bot, self.chat_id, self.message_id, &self.gate, snapshot).await;
    }
}

#[async_trait]
impl SessionObserver for TelegramObserver {
    async fn on_transition(
        &self,
        source: TickSource,
        transition: Transition,
        snapshot: SessionSnapshot,
    ) {
        match (transition, snapshot) {
            (Transition::Ended(result), _) => {
                log::info!(
                    "Quiz in chat {} ended by the clock ({:?}) with score {}",
                    self.chat_id,
                    result.reason,
                    result.final_score
                );
                show_results(
                    &self.bot,
                    self.chat_id,
                    self.message_id,
                    &self.gate,
                    result,
                    self.state.config.total_marks,
                )
                .await;
                self.state.finish_quiz(self.chat_id.0, self.message_id).await;
            }
            (Transition::Advanced { index, .. }, SessionSnapshot::Active(snapshot)) => {
                log::info!("Question timed out in chat {}, now on {}", self.chat_id, index + 1);
                self.redraw(&snapshot).await;
            }
            (Transition::Ticked, SessionSnapshot::Active(snapshot))
                if should_refresh(source, &snapshot) =>
            {
                self.redraw(&snapshot).await;
            }
            _ => {}
        }
    }
}
