use std::path::PathBuf;

use clap::Parser;
use ecowitt_collector::{
    api::{self, ApiState},
    config::{Config, StorageBackend},
    storage::{ObservationStorage, memory::MemoryStorage, sqlite::SqliteStorage},
};
use ecowitt_core::{PayloadDecoder, UnitNormalizer};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "ecowitt-collector")]
#[command(about = "Receives Ecowitt weather station reports and stores them")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ecowitt-collector.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = if config_found {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if config_found {
        info!(path = ?cli.config, "Loaded configuration");
    } else {
        info!(path = ?cli.config, "No configuration file found, using defaults");
    }

    match &config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory observation storage");
            run_server(MemoryStorage::new(), &config).await?;
        }
        StorageBackend::Sqlite { path } => {
            info!(path = ?path, table = %config.storage.table, "Using SQLite observation storage");
            let storage = SqliteStorage::new(path, &config.storage.table).await?;
            run_server(storage, &config).await?;
        }
    }

    Ok(())
}

async fn run_server<S>(storage: S, config: &Config) -> color_eyre::Result<()>
where
    S: ObservationStorage,
{
    let state = ApiState {
        decoder: PayloadDecoder::new(config.station.unknown_fields),
        normalizer: UnitNormalizer::new(config.station.wind_direction_offset),
        storage,
        write_timeout: config.storage.write_timeout(),
    };
    info!(
        wind_direction_offset = state.normalizer.wind_offset(),
        unknown_fields = ?state.decoder.unknown_fields(),
        "Station settings"
    );
    let app = api::api_router(state, &config.server.report_path);

    let cancel = CancellationToken::new();

    let http_addr = config.server.http_addr;
    let listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, report_path = %config.server.report_path, "HTTP server listening");

    let mut server = tokio::spawn(api::serve(listener, app, cancel.clone()));

    tokio::select! {
        result = &mut server => {
            if let Err(e) = result? {
                tracing::error!(error = ?e, "HTTP server error");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
            // let in-flight reports finish their storage write
            server.await??;
        }
    }

    info!("HTTP server shut down");
    Ok(())
}
