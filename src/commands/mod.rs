use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Start a timed quiz on a topic, e.g. /quiz volcanoes")]
    Quiz(String),
    #[command(description = "Show the running quiz")]
    Status,
    #[command(description = "Stop the running quiz")]
    Stop,
    #[command(description = "Show help message")]
    Help,
}
