use std::sync::Arc;

use courtside_db::PgCapacityStore;
use courtside_worker::background::OpenPlayScheduler;
use courtside_worker::config::{LogFormat, WorkerConfig};
use courtside_worker::open_play::OpenPlayEvaluator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env().expect("Invalid worker configuration");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "courtside_worker=debug,courtside_db=info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!("Open play worker starting");

    let pool = courtside_db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!(
        max_connections = config.database_max_connections,
        "Database connection pool created"
    );

    courtside_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    courtside_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let evaluator = OpenPlayEvaluator::new(PgCapacityStore::new(pool.clone()))
        .with_transaction_scope(config.transaction_scope);
    let scheduler = OpenPlayScheduler::new(
        Arc::new(evaluator),
        config.evaluation_interval,
        config.pass_timeout,
    );
    let handle = scheduler.start();

    shutdown_signal().await;

    handle.stop(config.shutdown_timeout).await;
    pool.close().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
