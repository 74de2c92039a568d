use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use askpanel_core::view::render_html;
use askpanel_core::{AnswerClient, Config, ConversationStore, SendPipeline};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

const DEFAULT_LOG_FILTER: &str = "askpanel_tui=info,askpanel_core=info";

#[derive(Parser)]
#[command(name = "askpanel")]
#[command(version, about = "Floating Q&A chat panel for the terminal")]
struct Cli {
    /// Answer service URL (overrides ASKPANEL_ENDPOINT and the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Start with the chat panel expanded
    #[arg(long)]
    open: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
        /// Print the conversation as an HTML fragment instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Show or update the saved configuration
    Config {
        /// Save this endpoint as the default
        #[arg(long)]
        set_endpoint: Option<String>,
        /// Save the number of text rows the input may grow to
        #[arg(long)]
        input_rows: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let log_path = init_file_logging();
            let config = load_config();
            let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
            info!(%endpoint, log = ?log_path, "starting askpanel");
            run_tui(endpoint, &config, cli.open).await
        }
        Some(Commands::Ask { question, html }) => {
            init_stderr_logging();
            let config = load_config();
            let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
            ask_once(&endpoint, &question, html).await
        }
        Some(Commands::Config { set_endpoint, input_rows }) => {
            init_stderr_logging();
            update_config(cli.endpoint.as_deref(), set_endpoint, input_rows)
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// The TUI owns the terminal, so logs go to a file in the cache directory
fn init_file_logging() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("askpanel");
    std::fs::create_dir_all(&dir).ok()?;
    let path = dir.join("askpanel.log");
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Some(path)
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// A broken config file is not fatal; fall back to defaults
fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load config, using defaults");
        Config::default()
    })
}

async fn run_tui(endpoint: String, config: &Config, open: bool) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let source = Arc::new(AnswerClient::new(&endpoint));
    let mut app = App::new(endpoint, source, config.input_max_rows(), events.sender());
    if open {
        app.toggle_panel();
    }

    let result = run_app(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result
}

async fn run_app(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
    }
    info!("quitting");
    Ok(())
}

async fn ask_once(endpoint: &str, question: &str, html: bool) -> Result<()> {
    let pipeline = SendPipeline::new(Arc::new(AnswerClient::new(endpoint)));
    let mut store = ConversationStore::new();
    store.set_draft(question);

    let Some(pending) = pipeline.submit(&mut store) else {
        bail!("question is empty");
    };
    pending.settle(&mut store).await;

    let state = store.state();
    if html {
        println!("{}", render_html(state));
    } else if let Some(answer) = state.last_message() {
        println!("{}", answer.text());
    }

    if state.has_error() {
        bail!("request to {endpoint} failed: {}", state.last_error);
    }
    Ok(())
}

fn update_config(
    cli_endpoint: Option<&str>,
    set_endpoint: Option<String>,
    input_rows: Option<u16>,
) -> Result<()> {
    let mut config = load_config();
    let path = Config::get_config_path()?;

    if set_endpoint.is_some() || input_rows.is_some() {
        if let Some(endpoint) = set_endpoint {
            config.endpoint = Some(endpoint);
        }
        if let Some(rows) = input_rows {
            config.input_max_rows = Some(rows);
        }
        config.save()?;
        info!(path = %path.display(), "config saved");
    }

    println!("config:     {}", path.display());
    println!("endpoint:   {}", config.resolve_endpoint(cli_endpoint));
    println!("input rows: {}", config.input_max_rows());
    Ok(())
}
