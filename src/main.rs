use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use missionlog_core::day::parse_day;
use missionlog_core::{sweep, Clock, Database, FixedClock, RangeAggregator, SystemClock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use missionlog::api;
use missionlog::config::Config;

#[derive(Parser)]
#[command(name = "missionlog")]
#[command(about = "Daily mission tracker with completion history, stats and streaks")]
struct Cli {
    /// Config file (default: <config dir>/missionlog.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address, overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Port for HTTP API, overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print range stats for a user as JSON
    Stats {
        #[arg(short, long)]
        user: String,

        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last day of the window (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Treat this day as today
        #[arg(long)]
        today: Option<String>,
    },
    /// Delete completion entries dated before a day
    Sweep {
        /// Cutoff day (default: today)
        #[arg(long)]
        before: Option<String>,
    },
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let db = match &config.database.path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    tracing::info!("Starting missionlog server on {}:{}", host, port);

    let db = open_database(config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.utc_offset()?));
    let app = api::create_router(api::AppState::new(db, clock, config.stats_config()?));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("missionlog listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "missionlog=info,missionlog_core=info,tower_http=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;
    let offset = config.utc_offset()?;

    match cli.command {
        Some(Commands::Serve { host, port }) => serve(&config, host, port).await?,
        Some(Commands::Stats {
            user,
            start,
            end,
            today,
        }) => {
            let clock: Arc<dyn Clock> = match today {
                Some(raw) => Arc::new(FixedClock::at_day(parse_day(&raw, offset)?, offset)),
                None => Arc::new(SystemClock::new(offset)),
            };
            let db = open_database(&config)?;
            let aggregator = RangeAggregator::new(db, clock, config.stats_config()?);

            let stats = aggregator.range_stats(&user, start.as_deref(), end.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Some(Commands::Sweep { before }) => {
            let cutoff = match before {
                Some(raw) => parse_day(&raw, offset)?,
                None => SystemClock::new(offset).today(),
            };
            let db = open_database(&config)?;
            let purged = sweep::purge_entries_before(&db, cutoff)?;
            println!("Removed {} completion entries before {}", purged, cutoff);
        }
        None => serve(&config, None, None).await?,
    }

    Ok(())
}
