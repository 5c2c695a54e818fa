mod types;
mod commands;
mod handlers;
mod error;
mod state;
mod keyboard;
mod difficulty;
mod session;
mod summary;
mod provider;
mod clock;
mod config;
mod render;

pub use types::*;
pub use commands::*;
pub use handlers::*;
pub use error::*;
pub use state::*;
pub use keyboard::*;
pub use difficulty::*;
pub use session::*;
pub use summary::*;
pub use provider::*;
pub use clock::*;
pub use config::*;
pub use render::*;
