mod config;
mod db;
mod error;
mod handlers;
mod models;
mod orchestrator;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use analyticore_client::analysis::AnalysisClient;
use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, StoreBackend};
use orchestrator::JobOrchestrator;
use routes::jobs::job_routes;
use state::AppState;
use store::{InMemoryJobStore, JobStore, PgJobStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // The pool is owned here so it can be drained after the server stops.
    let (store, pool) = match &config.store {
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = db::init_db(database_url, *max_connections).await?;
            let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool.clone()));
            (store, Some(pool))
        }
        StoreBackend::Memory => {
            warn!("using the in-memory job store; jobs are lost on restart");
            let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
            (store, None)
        }
    };

    let analyzer = AnalysisClient::new(&config.analysis_service_url, config.analysis_timeout)
        .context("could not build the analysis client")?;
    let orchestrator = JobOrchestrator::new(
        store,
        Arc::new(analyzer),
        config.analysis_timeout,
        config.submit_mode,
    );

    let app = job_routes(AppState::new(orchestrator.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors(config.client_url.as_deref())?);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("could not bind {}", config.bind_addr))?;
    info!(
        addr = %config.bind_addr,
        mode = ?config.submit_mode,
        analysis = %config.analysis_service_url,
        "gateway listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    orchestrator.shutdown().await;
    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("gateway stopped");
    Ok(())
}

fn cors(client_url: Option<&str>) -> anyhow::Result<CorsLayer> {
    let origin = match client_url {
        Some(url) => AllowOrigin::exact(
            url.parse::<HeaderValue>()
                .with_context(|| format!("invalid CLIENT_URL: {url}"))?,
        ),
        None => AllowOrigin::any(),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "could not listen for ctrl-c");
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
                warn!(error = %e, "could not listen for SIGTERM");
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
    info!("shutdown requested, draining");
}
