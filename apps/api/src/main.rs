mod config;
mod db;
mod errors;
mod evaluation;
mod goals;
mod models;
mod oracle;
mod routes;
mod state;
mod tasks;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, PgStore};
use crate::evaluation::engine::Evaluator;
use crate::oracle::HttpOracle;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tasks::service::TaskService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Focus API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    // Initialize scoring oracle
    let oracle = HttpOracle::new(&config.oracle)?;
    info!(
        "Scoring oracle initialized (transport: {:?}, model: {}, timeout: {:?})",
        config.oracle.transport,
        oracle.model(),
        config.oracle.timeout
    );

    let evaluator = Evaluator::new(Arc::new(oracle), store.clone());
    let tasks = TaskService::new(store.clone(), store.clone(), store.clone(), evaluator);

    // Build app state
    let state = AppState {
        config: config.clone(),
        tasks,
        goals: store,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
