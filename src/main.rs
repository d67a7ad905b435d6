use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{info, warn};

mod app;
mod chat;
mod client;
mod config;
mod error;
mod form;
mod handler;
mod logging;
mod transcript;
mod tui;
mod ui;

use app::App;
use client::AskClient;
use config::Config;
use transcript::FALLBACK_ANSWER;

#[derive(Parser)]
#[command(name = "ask-chat", version)]
#[command(about = "Chat with a question-answering server over POST /ask")]
struct Cli {
    /// Base URL of the server
    #[arg(long, global = true, env = "ASK_CHAT_SERVER_URL")]
    server_url: Option<String>,
    /// Path of the ask endpoint
    #[arg(long, global = true)]
    ask_path: Option<String>,
    /// Request timeout in seconds (0 disables it)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init()?;

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load config, using defaults");
        Config::new()
    });
    if let Some(server_url) = cli.server_url {
        config.server_url = Some(server_url);
    }
    if let Some(ask_path) = cli.ask_path {
        config.ask_path = Some(ask_path);
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = Some(timeout);
    }

    match cli.command {
        None => run_chat(&config).await,
        Some(Commands::Ask { question }) => ask_once(&config, &question).await,
        Some(Commands::Config { save }) => show_config(&config, save),
    }
}

fn build_client(config: &Config) -> Result<AskClient> {
    Ok(AskClient::new(
        &config.server_url(),
        &config.ask_path(),
        config.request_timeout(),
    )?)
}

async fn run_chat(config: &Config) -> Result<()> {
    let client = build_client(config)?;
    info!(endpoint = %client.endpoint(), "starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(client, events.sender(), config.drop_stale_responses);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("chat closed");
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

async fn ask_once(config: &Config, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        bail!("question is empty");
    }

    let client = build_client(config)?;
    println!("{} {}", "You:".bold().cyan(), question);

    match client.ask(question).await {
        Ok(answer) => {
            println!("{} {}", "AI:".bold().yellow(), answer);
            Ok(())
        }
        Err(e) => {
            if e.is_request_failure() {
                println!("{} {}", "AI:".bold().yellow(), FALLBACK_ANSWER);
            }
            eprintln!("{}: {}", "Error".red(), e);
            println!("Make sure the server is running at {}", client.endpoint().as_str().bold());
            bail!("ask request failed")
        }
    }
}

fn show_config(config: &Config, save: bool) -> Result<()> {
    println!("\n{}", "ask-chat configuration".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    println!("  server_url            {}", config.server_url().green());
    println!("  ask_path              {}", config.ask_path().green());
    println!(
        "  request_timeout_secs  {}",
        config
            .request_timeout()
            .map(|t| t.as_secs().to_string())
            .unwrap_or_else(|| "none".to_string())
            .green()
    );
    println!("  drop_stale_responses  {}", config.drop_stale_responses.to_string().green());
    println!("  log file              {}", logging::log_path()?.display().to_string().dimmed());

    if save {
        let path = config.save()?;
        println!("\nSaved to {}", path.display().to_string().bold());
    } else {
        println!("\nConfig file: {}", Config::get_config_path()?.display().to_string().dimmed());
    }

    Ok(())
}
