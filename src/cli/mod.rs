pub mod args;
pub mod commands;
pub mod dispatcher;
pub mod help;
pub mod output;
pub mod repl;
pub mod router;
pub mod terminal;

pub use args::{Cli, Commands};
pub use commands::CommandHandler;
pub use dispatcher::{Dispatcher, Flow};
pub use output::{OutputFormatter, Spinner};
pub use router::Command;
pub use terminal::{ConsoleTerminal, Terminal};
