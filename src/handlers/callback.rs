use std::error::Error;
use std::sync::Arc;
use teloxide::dispatching::DpHandlerDescription;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, MessageId};

use super::{close_message, show_question, show_results, HandlerResult};
use crate::keyboard::QuizAction;
use crate::session::{SessionSnapshot, Transition};
use crate::state::BotState;

const NOT_RUNNING: &str = "This quiz is no longer running.";

pub fn quiz_callback_handler(
    state: Arc<BotState>,
) -> dptree::Handler<'static, DependencyMap, HandlerResult, DpHandlerDescription> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let state = state.clone();
        async move { handle_callback_query(bot, q, state).await }
    })
}

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    state: Arc<BotState>,
) -> HandlerResult {
    let CallbackQuery {
        id, message, data, ..
    } = query;

    let mut notice = None;
    if let (Some(message), Some(data)) = (message, data) {
        if let Some(action) = QuizAction::parse(&data) {
            notice = handle_action(&bot, message.chat.id, message.id, action, &state).await?;
        }
    }

    let mut answer = bot.answer_callback_query(id);
    if let Some(text) = notice {
        answer = answer.text(text);
    }
    answer.await?;
    Ok(())
}

/// Applies a button press. Returns a short notice for the callback answer.
async fn handle_action(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    action: QuizAction,
    state: &Arc<BotState>,
) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
    let quiz = match state.active_quiz(chat_id.0).await {
        Some(quiz) if quiz.message_id == message_id => quiz,
        _ => return Ok(Some(NOT_RUNNING.to_string())),
    };

    match action {
        QuizAction::Select { epoch, index } => match quiz.clock.select_option(epoch, index).await {
            Ok(Some(SessionSnapshot::Active(snapshot))) => {
                show_question(bot, chat_id, message_id, &quiz.gate, &snapshot).await;
                Ok(None)
            }
            Ok(_) => Ok(Some("That question has already moved on.".to_string())),
            Err(e) => {
                log::debug!("Ignoring selection in chat {}: {}", chat_id, e);
                Ok(Some(NOT_RUNNING.to_string()))
            }
        },
        QuizAction::Next { epoch } => match quiz.clock.submit(epoch).await {
            Ok(Some(Transition::Advanced { credited, .. })) => {
                if let SessionSnapshot::Active(snapshot) = quiz.clock.snapshot().await {
                    show_question(bot, chat_id, message_id, &quiz.gate, &snapshot).await;
                }
                let notice = if credited > 0 {
                    format!("🎉 Correct! You earned {} points!", credited)
                } else {
                    "❌ Sorry, that's incorrect!".to_string()
                };
                Ok(Some(notice))
            }
            Ok(Some(Transition::Ended(result))) => {
                log::info!("Quiz in chat {} completed with score {}", chat_id, result.final_score);
                show_results(
                    bot,
                    chat_id,
                    message_id,
                    &quiz.gate,
                    result,
                    state.config.total_marks,
                )
                .await;
                state.finish_quiz(chat_id.0, message_id).await;
                Ok(None)
            }
            Ok(Some(_)) => Ok(None),
            Ok(None) => Ok(Some("Pick an answer for the current question first.".to_string())),
            Err(e) => {
                log::debug!("Ignoring submit in chat {}: {}", chat_id, e);
                Ok(Some(NOT_RUNNING.to_string()))
            }
        },
        QuizAction::End => {
            state.finish_quiz(chat_id.0, message_id).await;
            quiz.clock.stop();
            let score = match quiz.clock.snapshot().await {
                SessionSnapshot::Active(snapshot) => snapshot.score,
                SessionSnapshot::Ended(result) => result.final_score,
            };
            close_message(
                bot,
                chat_id,
                message_id,
                &quiz.gate,
                format!("Quiz ended! Your final score: {} points", score),
            )
            .await;
            Ok(None)
        }
    }
}
