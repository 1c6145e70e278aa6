use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "ayre")]
#[command(about = "Terminal companion for Gemini with persistent chats, files and web pages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding chat transcripts
    #[arg(long, value_name = "DIR")]
    pub chats_dir: Option<PathBuf>,

    /// Chat to open instead of the most recent one
    #[arg(long, value_name = "NAME")]
    pub chat: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create ~/.ayre with a default configuration
    Init,
    /// Show configuration
    Config,
    /// Run diagnostics
    Doctor,
    /// Show version information
    Version,
}

impl Cli {
    /// Folds command-line overrides into loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(dir) = &self.chats_dir {
            settings.session.chats_dir = dir.display().to_string();
        }
        if self.no_color {
            settings.output.use_colors = false;
        }
    }
}
