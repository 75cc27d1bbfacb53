//! wahlcache - command line front-end for election logistics.
//!
//! Select an election, watch the submission status dashboard, upload
//! documents per polling location and build QR sticker collections.

mod commands;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wahlcache_core::models::TrafficLight;
use wahlcache_core::{ApiClient, Config, ContextCache, FileStore, SystemClock};

/// Log file name inside the cache directory
const LOG_FILE: &str = "wahlcache.log";

#[derive(Parser)]
#[command(name = "wahlcache", version, about = "Election logistics: status, uploads and QR stickers")]
struct Cli {
    /// Override the backend base URL (e.g. http://localhost:8080/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List selectable elections
    Elections,
    /// Select the active election and preload its data
    Select { election_id: String },
    /// Show the active election
    Context,
    /// Refresh status and reference data for the active election
    Preload,
    /// Show the status dashboard
    Status {
        /// Only show this district
        #[arg(long)]
        district: Option<String>,
        /// Only show this traffic-light state
        #[arg(long, value_enum)]
        light: Option<LightArg>,
        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
        /// Keep refreshing every 30 seconds until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// List reference data (BKZ to organization)
    Betriebe,
    /// List stored documents for a location
    Files { district: String, location_code: String },
    /// Upload documents for a location
    Upload {
        district: String,
        location_code: String,
        #[arg(long, value_name = "FILE")]
        wahlausschreiben: Vec<PathBuf>,
        #[arg(long, value_name = "FILE")]
        niederschrift: Vec<PathBuf>,
        #[arg(long, value_name = "FILE")]
        wahlvorschlag: Vec<PathBuf>,
    },
    /// Build the QR target URL for a location
    Qr(commands::QrArgs),
    /// Decode a QR target URL or token
    QrDecode { input: String },
    /// Manage the sticker collection of the active election
    Stickers {
        #[command(subcommand)]
        action: StickerAction,
    },
}

#[derive(Subcommand)]
enum StickerAction {
    /// List collected stickers
    List,
    /// Add a rendered sticker image
    Add {
        location_code: String,
        image: PathBuf,
        #[arg(long)]
        betrieb: Option<String>,
    },
    /// Remove a sticker by its list position (starting at 1)
    Remove { position: usize },
    /// Remove all stickers
    Clear,
    /// Print the A4 sheet layout of the collection
    Layout,
}

#[derive(Clone, Copy, ValueEnum)]
enum LightArg {
    Green,
    Yellow,
    Red,
}

impl From<LightArg> for TrafficLight {
    fn from(arg: LightArg) -> Self {
        match arg {
            LightArg::Green => TrafficLight::Green,
            LightArg::Yellow => TrafficLight::Yellow,
            LightArg::Red => TrafficLight::Red,
        }
    }
}

/// Initialize the tracing subscriber for logging.
/// RUST_LOG controls the level (default warn); a daily log file is written
/// to the cache directory as well.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?.with_env_overrides();
    if let Some(url) = cli.api_url.clone() {
        config.api_base_url = Some(url);
    }

    let cache_dir = config.cache_dir()?;
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
    let _log_guard = init_tracing(&cache_dir);
    info!(api = config.api_base_url(), "wahlcache starting");

    let client = ApiClient::new(&config)?;
    let store = FileStore::new(cache_dir.join("store"))?;
    let cache = ContextCache::new(Arc::new(client), Arc::new(store), Arc::new(SystemClock));

    match cli.command {
        Command::Elections => commands::elections(&cache).await,
        Command::Select { election_id } => commands::select(&cache, &election_id).await,
        Command::Context => commands::context(&cache),
        Command::Preload => commands::preload(&cache).await,
        Command::Status { district, light, refresh, watch } => {
            let filter = wahlcache_core::dashboard::DashboardFilter {
                district,
                traffic_light: light.map(TrafficLight::from),
            };
            commands::status(&cache, &filter, refresh, watch).await
        }
        Command::Betriebe => commands::betriebe(&cache).await,
        Command::Files { district, location_code } => {
            commands::files(&cache, &district, &location_code).await
        }
        Command::Upload {
            district,
            location_code,
            wahlausschreiben,
            niederschrift,
            wahlvorschlag,
        } => {
            let files = commands::UploadPaths {
                wahlausschreiben,
                niederschrift,
                wahlvorschlag,
            };
            commands::upload(&cache, &district, &location_code, files).await
        }
        Command::Qr(args) => commands::qr(&cache, &config, args).await,
        Command::QrDecode { input } => commands::qr_decode(&input),
        Command::Stickers { action } => match action {
            StickerAction::List => commands::stickers_list(&cache),
            StickerAction::Add { location_code, image, betrieb } => {
                commands::stickers_add(&cache, &location_code, &image, betrieb).await
            }
            StickerAction::Remove { position } => commands::stickers_remove(&cache, position),
            StickerAction::Clear => commands::stickers_clear(&cache),
            StickerAction::Layout => commands::stickers_layout(&cache),
        },
    }
}
