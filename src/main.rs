use anyhow::Result;
use clap::Parser;
use colored::*;
use is_terminal::IsTerminal;
use std::io::{self, Read};
use std::process::ExitCode;
use std::time::Instant;

use promptdesk::cli::{Cli, Commands};
use promptdesk::commands::{
    handle_config, handle_copy, handle_delete, handle_edit, handle_feedback, handle_list,
    handle_names, handle_new, handle_show, FeedbackKind, NameKind,
};
use promptdesk::{
    init_logging, log_command_execution, ApiClient, AppError, AppStore, AutoConfirm, Clipboard,
    ConsoleToaster, FilterCriteria, FilterEngine, LogConfig, PromptListRenderer, Settings,
    StdinConfirm,
};

// API futures are not Send, so everything runs on one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env file not found or readable - this is fine, use system env vars
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Only initialize logging if explicitly requested via env var
    let _log_guard = if LogConfig::requested() {
        match init_logging(LogConfig::from_env()) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("{} {}", "Warning:".yellow(), e);
                None
            }
        }
    } else {
        None
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !already_reported(&e) {
                eprintln!("{} {:#}", "Error:".red(), e);
            }
            ExitCode::FAILURE
        }
    }
}

/// Backend and validation failures were shown as toasts by the renderer
fn already_reported(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Api(_) | AppError::Validation(_))
    )
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(url) = cli.api_url {
        settings.api_url = url;
        settings.validate()?;
    }

    let Some(command) = cli.command else {
        return run_tui(settings).await;
    };

    let start = Instant::now();
    let name = command.name();
    let result = match command {
        Commands::Config(cmd) => handle_config(&settings, cmd, &mut io::stdout()),
        command => run_command(&settings, command).await,
    };
    log_command_execution(name, start.elapsed().as_millis() as u64, &result);
    result
}

async fn run_command(settings: &Settings, command: Commands) -> Result<()> {
    let api = ApiClient::new(settings.api_url.as_str(), settings.request_timeout())?;
    let engine = FilterEngine::new(settings.page_size, settings.tag_match);
    let renderer = PromptListRenderer::new(AppStore::new(), api, ConsoleToaster, engine)
        .with_toast_duration(settings.toast_duration());
    let mut out = io::stdout();

    match command {
        Commands::List {
            search,
            category,
            tag,
            all,
            json,
        } => {
            let criteria = FilterCriteria {
                search_query: search.unwrap_or_default(),
                category_id: category,
                tag_name: tag,
            };
            handle_list(&renderer, criteria, all, json, &mut out).await
        }
        Commands::Show { id, verbose } => handle_show(&renderer, &id, verbose, &mut out).await,
        Commands::New(fields) => {
            let piped = if fields.content.is_none() && !io::stdin().is_terminal() {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                Some(buffer)
            } else {
                None
            };
            handle_new(&renderer, fields, piped).await
        }
        Commands::Edit { id, fields } => handle_edit(&renderer, &id, fields).await,
        Commands::Delete { id, yes } => {
            if yes {
                handle_delete(&renderer, &id, &AutoConfirm(true), &mut out).await
            } else {
                handle_delete(&renderer, &id, &StdinConfirm, &mut out).await
            }
        }
        Commands::Copy { id } => handle_copy(&renderer, &id, &mut Clipboard::new()).await,
        Commands::Tags(cmd) => {
            handle_names(&renderer, NameKind::Tag, cmd, &StdinConfirm, &mut out).await
        }
        Commands::Categories(cmd) => {
            handle_names(&renderer, NameKind::Category, cmd, &StdinConfirm, &mut out).await
        }
        Commands::Comments(cmd) => {
            handle_feedback(&renderer, FeedbackKind::Comments, cmd, &mut out).await
        }
        Commands::Results(cmd) => {
            handle_feedback(&renderer, FeedbackKind::Results, cmd, &mut out).await
        }
        Commands::Config(cmd) => handle_config(settings, cmd, &mut out),
    }
}

#[cfg(feature = "tui")]
async fn run_tui(settings: Settings) -> Result<()> {
    use promptdesk::tui::PromptDeskTui;

    // Check if we have a proper terminal for TUI
    if !io::stdout().is_terminal() {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    }
    let api = ApiClient::new(settings.api_url.as_str(), settings.request_timeout())?;
    PromptDeskTui::new(api, Clipboard::new(), &settings).run().await
}

#[cfg(not(feature = "tui"))]
async fn run_tui(_settings: Settings) -> Result<()> {
    use clap::CommandFactory;
    Cli::command().print_help()?;
    Ok(())
}
