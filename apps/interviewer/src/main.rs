mod config;
mod errors;
mod extraction;
mod interview;
mod llm_client;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::PdfTextExtractor;
use crate::llm_client::{GeminiGenerator, ModelClient, RetryPolicy};
use crate::routes::build_router;
use crate::session::Session;
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

    info!("Starting Interviewer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model client
    let generator = match &config.gemini_api_base {
        Some(base) => GeminiGenerator::with_base_url(config.gemini_api_key.clone(), base.clone()),
        None => GeminiGenerator::new(config.gemini_api_key.clone()),
    }
    .context("Failed to build HTTP client")?;
    let policy = RetryPolicy {
        max_attempts: config.llm_max_attempts,
        timeout: config.llm_timeout,
        ..RetryPolicy::default()
    };
    let llm = ModelClient::new(Arc::new(generator), policy);
    info!(
        "LLM client initialized (model: {}, timeout: {}s, attempts: {})",
        llm.model(),
        policy.timeout.as_secs(),
        policy.max_attempts
    );

    let session = Session::new(Arc::new(PdfTextExtractor), llm);
    let state = AppState::new(session, config.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // single-user local tool

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
