//! Subscription worker entry point.

use event_store::{InMemoryEventStore, PostgresEventStore};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use worker::Config;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    prometheus_builder
        .install()
        .expect("failed to install Prometheus recorder");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    // 3. Build the store and run the worker
    match config.database_url.clone() {
        Some(database_url) => {
            tracing::info!("using PostgreSQL event store");
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("failed to connect to the event store database");
            let store = PostgresEventStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run event store migrations");

            let (worker, _dispatcher, _query_side) =
                worker::build_worker(store, &config).expect("failed to wire the worker");
            worker.run(shutdown).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory event store");
            let store = InMemoryEventStore::new();

            let (worker, _dispatcher, _query_side) =
                worker::build_worker(store, &config).expect("failed to wire the worker");
            worker.run(shutdown).await;
        }
    }

    tracing::info!("worker shut down gracefully");
}
