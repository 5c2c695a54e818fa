use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;

use super::{show_question, HandlerResult, TelegramObserver};
use crate::clock::SessionClock;
use crate::commands::Command;
use crate::provider::fetch_quiz;
use crate::render::{render_status, MessageGate};
use crate::session::{QuizSession, SessionSnapshot};
use crate::state::{ActiveQuiz, BotState};

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            bot.send_message(
                msg.chat.id,
                "
                \n 🧠 Use /quiz <topic> to get a freshly generated quiz on anything you like.
                \n ⏱ Every question has its own countdown (10s simple, 20s moderate, 30s difficult) and the whole quiz must be finished within 5 minutes.
                \n 🏆 Harder questions are worth more points.
                \n ❓ Use /help for additional guidance.
                ",
            )
            .await?;
        }
        Command::Quiz(topic) => {
            let topic = topic.trim();
            if topic.is_empty() {
                bot.send_message(msg.chat.id, "Please name a topic, for example /quiz black holes")
                    .await?;
            } else {
                start_quiz(bot, msg.chat.id, topic.to_string(), state).await?;
            }
        }
        Command::Status => {
            let text = match state.active_quiz(msg.chat.id.0).await {
                Some(quiz) => match quiz.clock.snapshot().await {
                    SessionSnapshot::Active(snapshot) => {
                        render_status(&quiz.topic, quiz.started_at, &snapshot)
                    }
                    SessionSnapshot::Ended(_) => "Your quiz is just finishing.".to_string(),
                },
                None => "No quiz is running. Use /quiz <topic> to start one.".to_string(),
            };
            bot.send_message(msg.chat.id, text).await?;
        }
        Command::Stop => {
            let text = match state.remove_quiz(msg.chat.id.0).await {
                Some(quiz) => {
                    quiz.clock.stop();
                    quiz.gate.lock().await.admit_close();
                    let score = match quiz.clock.snapshot().await {
                        SessionSnapshot::Active(snapshot) => snapshot.score,
                        SessionSnapshot::Ended(result) => result.final_score,
                    };
                    log::info!("Quiz in chat {} stopped by the user", msg.chat.id);
                    format!("Quiz stopped. Your score: {} points", score)
                }
                None => "No quiz is running.".to_string(),
            };
            bot.send_message(msg.chat.id, text).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

async fn start_quiz(
    bot: Bot,
    chat_id: ChatId,
    topic: String,
    state: Arc<BotState>,
) -> HandlerResult {
    if let Some(previous) = state.remove_quiz(chat_id.0).await {
        previous.clock.stop();
        previous.gate.lock().await.admit_close();
        log::info!("Replacing the running quiz in chat {}", chat_id);
    }

    let loading = bot
        .send_message(
            chat_id,
            format!(
                "Generating your quiz...\nCrafting challenging questions about \"{}\" just for you!",
                topic
            ),
        )
        .await?;

    let questions = match fetch_quiz(state.provider.as_ref(), &topic).await {
        Ok(questions) => questions,
        Err(e) => {
            log::error!("Failed to generate quiz on '{}': {}", topic, e);
            bot.edit_message_text(
                chat_id,
                loading.id,
                "Failed to generate quiz questions. Please try a different topic or try again in a moment.",
            )
            .await?;
            return Ok(());
        }
    };

    let session = match QuizSession::with_overall_budget(
        questions,
        state.config.policy.clone(),
        state.config.overall_seconds,
    ) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Could not start quiz on '{}': {}", topic, e);
            bot.edit_message_text(chat_id, loading.id, "That quiz could not be started. Please try again.")
                .await?;
            return Ok(());
        }
    };

    let gate = Arc::new(Mutex::new(MessageGate::default()));
    if let SessionSnapshot::Active(snapshot) = session.snapshot() {
        show_question(&bot, chat_id, loading.id, &gate, &snapshot).await;
    }
    log::info!(
        "Starting quiz on '{}' in chat {} with {} questions",
        topic,
        chat_id,
        session.len()
    );

    let observer = Arc::new(TelegramObserver {
        bot: bot.clone(),
        chat_id,
        message_id: loading.id,
        gate: gate.clone(),
        state: state.clone(),
    });
    let clock = SessionClock::start(session, observer);

    state
        .insert_quiz(
            chat_id.0,
            ActiveQuiz {
                topic,
                message_id: loading.id,
                started_at: Utc::now(),
                clock,
                gate,
            },
        )
        .await;

    Ok(())
}
