use domain::worker::setup;
use log::*;
use migration::{Migrator, MigratorTrait};
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialise logger: {e}");
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        std::process::exit(1);
    }

    info!(
        "Starting transcription worker [provider: {}]",
        config.transcription_provider
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        info!("Applying pending migrations");
        if let Err(e) = Migrator::up(db.as_ref(), None).await {
            error!("Failed to apply migrations: {e}");
            std::process::exit(1);
        }
    }

    let scheduler = match setup::from_config(&config, db).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Failed to set up worker: {e}");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    scheduler.run(cancel).await;
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
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

    info!("Shutdown signal received, stopping after the current task");
    cancel.cancel();
}
