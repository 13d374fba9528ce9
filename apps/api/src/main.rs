mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
mod tailoring;
mod uploads;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tailoring::pipeline::TailoringPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Tailor API v{}", env!("CARGO_PKG_VERSION"));

    if config.ai_credential.is_none() {
        warn!("GOOGLE_API_KEY is not set; tailoring requests will fail with AuthFailure");
    }

    // Initialize AI backend
    let generator = Arc::new(GeminiClient::from_config(&config));
    info!("AI client initialized (model: {})", generator.model());

    let pipeline = TailoringPipeline::from_config(&config, generator);
    pipeline.uploads().ensure_root().await?;
    info!(
        "Upload storage ready at {} (limit {} bytes, accepted: {:?})",
        pipeline.uploads().root().display(),
        config.upload_size_limit_bytes,
        config.accepted_extensions
    );

    let state = AppState {
        config: config.clone(),
        pipeline,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
