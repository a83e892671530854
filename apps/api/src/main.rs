mod analysis;
mod cms;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod players;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::analyzer::Analyzer;
use crate::cms::airtable::AirtableClient;
use crate::cms::webflow::WebflowClient;
use crate::cms::Publisher;
use crate::config::{AnalysisMode, Config};
use crate::db::create_pool;
use crate::llm_client::{CompletionBackend, DisabledBackend, GroqClient};
use crate::players::store::PgPlayerStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting FootPulse API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize completion backend
    let analyzer = Analyzer::from_config(build_backend(&config)?, &config);
    info!(
        "Analysis mode: {:?} (backend: {}, model: {})",
        analyzer.mode(),
        analyzer.backend().name(),
        config.llm.model
    );

    // CMS clients share one HTTP connection pool
    let http = cms::http_client()?;
    let publisher = Publisher::from_config(&config, &http);
    let webflow = config
        .webflow
        .as_ref()
        .map(|c| WebflowClient::new(http.clone(), c));
    let airtable = config
        .airtable
        .as_ref()
        .map(|c| AirtableClient::new(http.clone(), c));
    info!(
        "CMS sinks: {:?}, Webflow sync: {}",
        publisher.sink_names(),
        if webflow.is_some() { "enabled" } else { "disabled" }
    );

    // Build app state
    let state = AppState {
        store: Arc::new(PgPlayerStore::new(db)),
        analyzer,
        publisher,
        webflow,
        airtable,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the Webflow and Softr domains

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_backend(config: &Config) -> Result<Arc<dyn CompletionBackend>> {
    match (config.analysis_mode, &config.llm.api_key) {
        (AnalysisMode::Live, Some(api_key)) => Ok(Arc::new(GroqClient::new(
            config.llm.base_url.clone(),
            api_key.clone(),
            config.llm.model.clone(),
            config.llm.timeout,
        )?)),
        _ => Ok(Arc::new(DisabledBackend)),
    }
}
