pub mod ai;
pub mod cli;
pub mod config;
pub mod gui;
pub mod ingest;
pub mod session;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::{Cli, CommandHandler, Commands, Dispatcher};
pub use config::Settings;
pub use session::{Message, SessionStore};
