// scplay - type a search, pick a number, listen
// Playback starts as soon as enough of the track has landed locally

use anyhow::Result;
use clap::Parser;
use scplay::{ui::App, Config, Credentials, DurationRange, Player, SearchClient};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scplay")]
#[command(about = "Search remote tracks and play them while they download")]
struct Args {
    /// Log to stderr instead of the log file
    #[arg(long)]
    dev: bool,

    /// Use this config file instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// File holding the API client id
    #[arg(long)]
    credentials: Option<PathBuf>,
}

fn init_logging(dev: bool) -> Result<Option<WorkerGuard>> {
    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scplay=debug"));

    if dev {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(base_filter)
            .init();
        return Ok(None);
    }

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scplay")
        .join("logs");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&log_dir, "scplay.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .init();

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive or buffered log lines get lost on exit
    let _log_guard = init_logging(args.dev)?;
    info!("scplay starting up");

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let credentials_path = args
        .credentials
        .clone()
        .unwrap_or_else(|| config.credentials_file.clone());
    let credentials = match Credentials::load(&credentials_path) {
        Ok(credentials) => credentials,
        Err(e) => {
            // the one fatal error: no point in a session without an API key
            error!("{}", e);
            eprintln!(
                "Please place a file called \"{}\" containing only your API client id.",
                credentials_path.display()
            );
            std::process::exit(1);
        }
    };

    let client = reqwest::Client::new();
    let search = SearchClient::new(client.clone(), config.search.base_url.clone(), credentials.clone());
    let player = Player::from_config(&config, client, credentials)?;
    let range = DurationRange::from_minutes(
        config.search.min_duration_minutes,
        config.search.max_duration_minutes,
    );

    let mut app = App::new(search, player, range);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    app.run(stdin).await?;

    println!("👋 Bye!");
    Ok(())
}
