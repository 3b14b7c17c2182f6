use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use scrollfeed::app::App;
use scrollfeed::config::Config;
use scrollfeed::feed::{FeedController, RedditSource};

/// Get the config directory path (~/.config/scrollfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("scrollfeed"))
}

#[derive(Parser, Debug)]
#[command(
    name = "scrollfeed",
    about = "Scroll through a subreddit in the terminal, loading more posts as you go"
)]
struct Args {
    /// Config file (defaults to ~/.config/scrollfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subreddit to read (overrides the config file)
    #[arg(short, long)]
    subreddit: Option<String>,

    /// Posts per page, 1-100 (overrides the config file)
    #[arg(long, value_name = "N")]
    page_size: Option<u32>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Install the tracing subscriber. Filtering follows `RUST_LOG`.
///
/// Without `--log-file`, logs go to stderr only when `RUST_LOG` is set, since
/// stderr shares the terminal with the UI.
fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if std::env::var_os("RUST_LOG").is_some() => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_ref())?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };

    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(subreddit) = args.subreddit {
        config.subreddit = subreddit;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    config.validate().context("Invalid configuration")?;

    tracing::debug!(config = ?config, "Effective configuration");

    let source = RedditSource::from_config(&config)?;
    tracing::info!(endpoint = %source.endpoint(), "Using listing endpoint");

    let controller = FeedController::new(Arc::new(source), config.page_size);
    let mut app = App::new(controller, format!("r/{}", config.subreddit));

    scrollfeed::ui::run(&mut app).await?;

    let state = app.controller.current_state();
    tracing::info!(posts = state.items.len(), "Exiting");
    Ok(())
}
