use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotechat::{handler, tui, ui, App, CompletionApi, Config, OpenAIClient};

#[derive(Parser)]
#[command(name = "quotechat")]
#[command(author, version, about = "Chat that answers with classical quotations", long_about = None)]
struct Cli {
    /// Path to config.json (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the completion model
    #[arg(short, long)]
    model: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Where to write logs; the terminal belongs to the UI
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => Config::config_dir()?.join("quotechat.log"),
    };
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(model) = cli.model.clone() {
        config.model = Some(model);
    }

    let api: Option<Arc<dyn CompletionApi>> = config
        .api_key_from_env()
        .map(|key| Arc::new(OpenAIClient::with_base_url(&key, config.api_base())) as Arc<dyn CompletionApi>);
    info!(
        model = config.model(),
        api_base = config.api_base(),
        has_key = api.is_some(),
        "starting quotechat"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    let mut app = App::new(&config, api, events.sender());
    app.start_verification();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("exiting");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
