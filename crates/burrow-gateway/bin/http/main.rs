mod cli;
mod telemetry;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use burrow_core::LinkRepository;
use burrow_gateway::{App, AppState};
use burrow_generator::RandomGenerator;
use burrow_shortener::{ShortenerService, ShortenerSettings};
use burrow_storage::{InMemoryRepository, SqliteRepository};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init(config.log_format);

    info!(
        listen_addr = %config.listen_addr(),
        storage_backend = %config.storage,
        log_format = %config.log_format,
        "starting burrow gateway"
    );

    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_create_attempts)
        .build();

    match config.storage {
        StorageBackendArg::InMemory => {
            let capacity = usize::try_from(config.visit_queue_capacity)
                .context("visit queue capacity does not fit in memory")?;
            let repository = Arc::new(InMemoryRepository::with_queue_capacity(capacity));
            run_server(&config, Arc::clone(&repository), settings).await?;

            repository.shutdown().await;
            info!("pending visits flushed");
        }
        StorageBackendArg::Sqlite => {
            let repository = SqliteRepository::connect(&config.sqlite_dsn)
                .await
                .with_context(|| format!("failed to open sqlite database {}", config.sqlite_dsn))?;
            run_server(&config, repository.clone(), settings).await?;

            repository.close().await;
        }
    }

    info!("burrow gateway stopped");
    Ok(())
}

async fn run_server<R: LinkRepository>(
    config: &CLI,
    repository: R,
    settings: ShortenerSettings,
) -> anyhow::Result<()> {
    let service = ShortenerService::with_settings(repository, RandomGenerator::new(), settings);
    let state = AppState::new(Arc::new(service), config.public_base_url.clone());

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
