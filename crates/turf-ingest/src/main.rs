//! TDP Ingest - racing data ingestion tool

use anyhow::Result;
use clap::Parser;
use tracing::info;
use turf_common::logging::{init_logging, LogConfig, LogLevel};
use turf_ingest::config::IngestConfig;
use turf_ingest::cursor::Cursor;
use turf_ingest::stream::ReplaySource;
use turf_ingest::{db, service};

#[derive(Parser, Debug)]
#[command(name = "turf-ingest")]
#[command(author, version, about = "TDP racing data ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Full initial load
    Setup {
        /// Data spec to load
        #[arg(short, long, default_value = "RACE")]
        spec: String,

        /// Capture directory to replay
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Incremental update
    Update {
        /// Data spec to pull
        #[arg(short, long, default_value = "DIFF")]
        spec: String,

        /// Start cursor (YYYYMMDDHHMMSS); defaults through the checkpoint log
        #[arg(short, long)]
        from: Option<String>,

        /// Capture directory to replay
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Show store statistics and recent runs
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::from_env()
        .unwrap_or_default()
        .with_level(log_level)
        .with_file_prefix("turf-ingest");
    init_logging(&log_config)?;

    let config = IngestConfig::load()?;
    let pool = db::connect(&config.database).await?;
    db::init_schema(&pool).await?;

    match cli.command {
        Command::Setup { spec, dir } => {
            let source = ReplaySource::new(dir.unwrap_or_else(|| config.capture_dir.clone()));
            let report = service::run_setup(pool, source, config.pipeline(), &spec).await?;
            info!("{}", report.summary());
        },
        Command::Update { spec, from, dir } => {
            let source = ReplaySource::new(dir.unwrap_or_else(|| config.capture_dir.clone()));
            let from = from.as_deref().map(Cursor::parse).transpose()?;
            let report = service::run_update(pool, source, config.pipeline(), &spec, from).await?;
            info!("{}", report.summary());
        },
        Command::Stats => {
            let stats = service::stats(pool).await?;
            println!("races:     {:>10}", stats.counts.races);
            println!("results:   {:>10}", stats.counts.results);
            println!("horses:    {:>10}", stats.counts.horses);
            println!("odds:      {:>10}", stats.counts.odds);
            println!("weights:   {:>10}", stats.counts.weights);
            println!("schedules: {:>10}", stats.counts.schedules);
            if let Some(day) = stats.latest_race_day {
                println!("latest race day: {day}");
            }
            if !stats.recent_runs.is_empty() {
                println!("recent runs:");
                for run in stats.recent_runs {
                    println!(
                        "  {} {} {} {:?} read={} errored={}",
                        run.finished_at.as_deref().unwrap_or("-"),
                        run.run_type.as_str(),
                        run.data_spec,
                        run.status,
                        run.records_read,
                        run.records_errored
                    );
                }
            }
        },
    }

    Ok(())
}
