use anyhow::Result;
use clap::Parser;
use log::error;
use std::sync::Arc;

use ayre::ai::GeminiClient;
use ayre::cli::help::render_banner;
use ayre::cli::{repl, ConsoleTerminal, OutputFormatter};
use ayre::config::API_KEY_ENV;
use ayre::session::SystemPrompt;
use ayre::utils::BrowserOpener;
use ayre::{Cli, CommandHandler, Commands, Dispatcher, SessionStore, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Errors only unless asked for more; RUST_LOG still takes precedence
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Error
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            error!("Failed to load .env: {e}");
        }
    }

    if matches!(cli.command, Some(Commands::Version)) {
        println!("{}", CommandHandler::version());
        return Ok(());
    }

    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {e:#}");
            eprintln!("Error: Failed to load configuration: {e:#}");
            eprintln!("Fix or remove ~/.ayre/config.toml, or run 'ayre init'.");
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut settings);

    if let Some(command) = cli.command.clone() {
        let handler = CommandHandler::new(settings);
        match handler.handle_command(command).await {
            Ok(output) => println!("{output}"),
            Err(e) => {
                error!("Command failed: {e:#}");
                eprintln!("{}", handler.format_error(&format!("{e:#}")));
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let formatter = OutputFormatter::new(settings.output.use_colors);
    let Some(api_key) = settings.api_key() else {
        eprintln!(
            "{}",
            formatter.format_error(&format!(
                "{API_KEY_ENV} is not set. Add it to your environment or a .env file."
            ))
        );
        std::process::exit(1);
    };

    if let Err(e) = run_chat(&cli, settings, api_key).await {
        error!("Fatal error: {e:#}");
        eprintln!("{}", formatter.format_error(&format!("{e:#}")));
        std::process::exit(1);
    }

    Ok(())
}

async fn run_chat(cli: &Cli, settings: Settings, api_key: String) -> Result<()> {
    let formatter = OutputFormatter::new(settings.output.use_colors);
    println!("{}\n", render_banner(&formatter, &settings.persona.user_label));

    let model = Arc::new(GeminiClient::new(&settings, api_key)?);
    let store = SessionStore::new(
        settings.chats_dir(),
        SystemPrompt::from_file(settings.system_prompt_path()),
    )?;

    let mut dispatcher = Dispatcher::new(
        settings,
        store,
        model,
        Box::new(ConsoleTerminal::new()),
        Box::new(BrowserOpener),
    )?;
    dispatcher.start(cli.chat.as_deref())?;

    repl::run(&mut dispatcher).await
}
