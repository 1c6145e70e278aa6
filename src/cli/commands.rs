use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

use crate::ai::GeminiClient;
use crate::cli::{Commands, OutputFormatter, Spinner};
use crate::config::defaults::DEFAULT_SYSTEM_PROMPT;
use crate::config::{DefaultConfig, Settings, API_KEY_ENV};

/// Runs the one-shot subcommands that do not start a chat.
pub struct CommandHandler {
    settings: Settings,
    formatter: OutputFormatter,
}

impl CommandHandler {
    pub fn new(settings: Settings) -> Self {
        let formatter = OutputFormatter::new(settings.output.use_colors);
        Self {
            settings,
            formatter,
        }
    }

    pub async fn handle_command(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Init => self.handle_init(),
            Commands::Config => self.handle_config(),
            Commands::Doctor => self.handle_doctor().await,
            Commands::Version => Ok(Self::version()),
        }
    }

    fn handle_init(&self) -> Result<String> {
        info!("Initializing ayre");
        let mut messages = Vec::new();

        for dir in [
            Settings::data_dir()?,
            self.settings.chats_dir(),
            self.settings.drop_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let config_path = self.settings.get_config_path()?;
        messages.push(write_if_missing(
            &config_path,
            &DefaultConfig::create_default_config_file(),
        )?);

        let prompt_path = self.settings.system_prompt_path();
        messages.push(write_if_missing(
            &prompt_path,
            &format!("{DEFAULT_SYSTEM_PROMPT}\n"),
        )?);

        if self.settings.api_key().is_none() {
            messages.push(self.formatter.format_warning(&format!(
                "{API_KEY_ENV} is not set. Export it or add it to .env before chatting."
            )));
        }

        messages.push(self.formatter.format_success("ayre initialized successfully"));
        Ok(messages.join("\n"))
    }

    fn handle_config(&self) -> Result<String> {
        let credential = if self.settings.api_key().is_some() {
            "set"
        } else {
            "missing"
        };

        Ok(format!(
            "Ayre Configuration:\n\
            - Config file: {}\n\
            - Chats directory: {}\n\
            - System prompt: {}\n\
            - Drop folder: {}\n\
            - Model: {}\n\
            - API base: {}\n\
            - API key ({API_KEY_ENV}): {credential}\n\
            - Web timeout: {}s\n\
            - File uploads enabled: {}\n\
            - Use colors: {}\n\
            - History limit: {}",
            self.settings.get_config_path()?.display(),
            self.settings.chats_dir().display(),
            self.settings.system_prompt_path().display(),
            self.settings.drop_dir().display(),
            self.settings.model.name,
            self.settings.model.api_base,
            self.settings.web.timeout_secs,
            self.settings.files.uploads_enabled,
            self.settings.output.use_colors,
            self.settings.output.history_limit,
        ))
    }

    async fn handle_doctor(&self) -> Result<String> {
        let spinner = Spinner::new("Running diagnostics...");
        let mut diagnostics = Vec::new();

        let data_dir = Settings::data_dir()?;
        if data_dir.exists() {
            diagnostics.push("✓ ~/.ayre directory exists".to_string());
        } else {
            diagnostics.push("✗ ~/.ayre directory missing (run: ayre init)".to_string());
        }

        let chats_dir = self.settings.chats_dir();
        if chats_dir.is_dir() {
            diagnostics.push(format!("✓ Chats directory {}", chats_dir.display()));
        } else {
            diagnostics.push(format!(
                "✗ Chats directory {} missing (created on first run)",
                chats_dir.display()
            ));
        }

        match self.settings.api_key() {
            Some(key) => {
                diagnostics.push(format!("✓ {API_KEY_ENV} found"));
                let reachable = match GeminiClient::new(&self.settings, key) {
                    Ok(client) => client.verify_connection().await,
                    Err(e) => Err(e),
                };
                match reachable {
                    Ok(()) => diagnostics.push(format!(
                        "✓ Gemini model {} reachable",
                        self.settings.model.name
                    )),
                    Err(e) => diagnostics.push(format!("✗ Gemini API: {e:#}")),
                }
            }
            None => diagnostics.push(format!("✗ {API_KEY_ENV} not set")),
        }

        spinner.stop();
        Ok(format!("Ayre Health Check:\n{}", diagnostics.join("\n")))
    }

    pub fn version() -> String {
        format!(
            "ayre {}\nRust version: {}\nPlatform: {}-{}",
            env!("CARGO_PKG_VERSION"),
            env!("AYRE_RUSTC_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    }

    pub fn format_error(&self, message: &str) -> String {
        self.formatter.format_error(message)
    }
}

fn write_if_missing(path: &Path, content: &str) -> Result<String> {
    if path.exists() {
        return Ok(format!("- Keeping existing {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(format!("- Wrote {}", path.display()))
}
