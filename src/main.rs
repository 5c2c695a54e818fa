use std::error::Error;
use std::sync::Arc;
use teloxide::prelude::*;

use timed_quiz_bot::{build_provider, command_handler, quiz_callback_handler, BotState, Command, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Read .env before the logger so RUST_LOG can live there too.
    let config = Config::from_env()?;
    pretty_env_logger::init();
    log::info!("Starting timed quiz bot...");

    // Initialize bot with token from environment
    let bot = Bot::from_env();

    let provider = build_provider(&config)?;
    log::info!(
        "Quizzes last {}s overall and are scored out of {}",
        config.overall_seconds,
        config.total_marks
    );

    let state = Arc::new(BotState::new(provider, config));

    let handler = dptree::entry()
        .branch(Update::filter_message().filter_command::<Command>().endpoint(
            |bot: Bot, msg: Message, cmd: Command, state: Arc<BotState>| async move {
                command_handler(bot, msg, cmd, state.clone()).await
            },
        ))
        .branch(quiz_callback_handler(state.clone()));

    log::info!("Starting command dispatching...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
