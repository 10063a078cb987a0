//! CLI entry point for the accidents dashboard.
//!
//! Provides subcommands for serving the interactive dashboard and for
//! printing or exporting individual aggregation tables.

use accidents_dashboard::analyzers::{Dimension, TimeDimension, proportions_by, severity_by};
use accidents_dashboard::config::DashboardConfig;
use accidents_dashboard::features::AccidentTable;
use accidents_dashboard::maps::FsMapStore;
use accidents_dashboard::output::{write_json, write_table_csv};
use accidents_dashboard::server::{AppState, serve};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "accidents_dashboard")]
#[command(about = "Interactive dashboard over UK road accident data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the accident files and serve the dashboard
    Serve {
        /// Accident CSV files (overrides ACCIDENTS_DATA_FILES)
        #[arg(short, long = "data", value_name = "FILE")]
        data: Vec<PathBuf>,

        /// Directory holding the pre-rendered map documents
        #[arg(short, long)]
        map_dir: Option<PathBuf>,

        /// Address to listen on, e.g. 127.0.0.1:8050
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Print one aggregation table as JSON
    Summarize {
        /// Year, Month, weekday_label, Hour, area_type or speed_limit
        #[arg(short, long, default_value = "Year")]
        dimension: String,

        /// Accident CSV files (overrides ACCIDENTS_DATA_FILES)
        #[arg(long = "data", value_name = "FILE")]
        data: Vec<PathBuf>,
    },
    /// Write a time-dimension severity table to CSV
    Export {
        /// Year, Month, weekday_label or Hour
        #[arg(short, long, default_value = "Year")]
        dimension: String,

        /// CSV file to write
        #[arg(short, long, default_value = "severity_table.csv")]
        output: String,

        /// Accident CSV files (overrides ACCIDENTS_DATA_FILES)
        #[arg(long = "data", value_name = "FILE")]
        data: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/accidents_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("accidents_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::from_env()?;

    match cli.command {
        Commands::Serve {
            data,
            map_dir,
            bind,
        } => {
            let config = config.with_overrides(data, map_dir, bind);
            let table = load_table(&config)?;
            let maps = FsMapStore::new(&config.map_dir);

            let listener = TcpListener::bind(config.bind_addr)
                .await
                .with_context(|| format!("failed to bind {}", config.bind_addr))?;
            info!(map_dir = %config.map_dir.display(), "Map documents directory");

            serve(listener, AppState::new(table, maps)).await?;
        }
        Commands::Summarize { dimension, data } => {
            let dimension: Dimension = dimension.parse()?;
            let config = config.with_overrides(data, None, None);
            let table = load_table(&config)?;
            let stdout = std::io::stdout().lock();

            match dimension {
                Dimension::Time(time) => write_json(stdout, &severity_by(&table, time))?,
                Dimension::Category(category) => {
                    write_json(stdout, &proportions_by(&table, category))?
                }
            }
        }
        Commands::Export {
            dimension,
            output,
            data,
        } => {
            let time_dimension: TimeDimension = dimension.parse()?;
            let config = config.with_overrides(data, None, None);
            let table = load_table(&config)?;

            write_table_csv(&output, &severity_by(&table, time_dimension))?;
            info!(output, dimension = time_dimension.name(), "Severity table exported");
        }
    }

    Ok(())
}

/// Builds the accident table; any load failure is fatal.
#[tracing::instrument(skip_all, fields(files = config.data_files.len()))]
fn load_table(config: &DashboardConfig) -> Result<AccidentTable> {
    let table = AccidentTable::load(config.data_files.as_slice()).context("failed to load accident data")?;

    if let Some((first, last)) = table.year_range() {
        info!(records = table.len(), first_year = first, last_year = last, "Accident table ready");
    } else {
        info!("Accident table is empty");
    }

    Ok(table)
}
