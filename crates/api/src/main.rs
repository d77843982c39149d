//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat, StoreBackend};
use ordering::{InMemoryLogisticsPartner, Ordering};
use store::{DemoData, FulfillmentCoordinator, InMemoryStore, PostgresStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

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

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn build_ordering(config: &Config) -> Arc<dyn Ordering> {
    let coordinator = FulfillmentCoordinator::new(config.transaction_timeout);
    let logistics = InMemoryLogisticsPartner::new();

    match config.store_backend {
        StoreBackend::Memory => {
            let store = InMemoryStore::new().with_coordinator(coordinator);
            if config.seed_demo_data {
                store.seed(DemoData::default()).await;
            }
            api::build_ordering(store, logistics)
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL is validated by Config");
            let store = PostgresStore::connect(url, config.database_max_connections)
                .await
                .expect("failed to connect to PostgreSQL")
                .with_coordinator(coordinator);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            if config.seed_demo_data {
                store
                    .seed(DemoData::default())
                    .await
                    .expect("failed to seed demo data");
            }
            api::build_ordering(store, logistics)
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env().expect("invalid configuration");
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Open the store and compose the service
    tracing::info!(
        backend = ?config.store_backend,
        seed = config.seed_demo_data,
        timeout_ms = config.transaction_timeout.as_millis() as u64,
        "initializing store"
    );
    let ordering = build_ordering(&config).await;
    let app = api::create_app(api::AppState::new(ordering), metrics_handle);

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
