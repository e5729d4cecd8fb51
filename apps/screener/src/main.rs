use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use screener::config::{Config, EmbeddingBackend};
use screener::embedding::{
    Embedder, HashEmbedder, MiniLmEmbedder, MiniLmEmbedderConfig, RemoteEmbedder,
    RemoteEmbedderConfig,
};
use screener::parsing::{ParserConfig, ResumeParser};
use screener::routes::build_router;
use screener::scoring::ScoringEngine;
use screener::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));

    // Parser vocabulary: built-in unless a JSON override is configured
    let parser_config = match &config.parser_config_path {
        Some(path) => ParserConfig::from_json_file(path)
            .with_context(|| format!("loading parser config from {}", path.display()))?,
        None => ParserConfig::default(),
    };
    let parser = ResumeParser::new(parser_config)?;
    info!("Resume parser initialized");

    // Embedding backend; an unusable one stops startup here
    let embedder = build_embedder(&config).await?;
    let engine = ScoringEngine::new(embedder)?;
    info!("Scoring engine initialized ({:?})", engine.provider());

    let state = AppState {
        parser: Arc::new(parser),
        engine: Arc::new(engine),
        config: config.clone(),
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

/// Constructs the configured embedding backend, checking a remote service or loading a local
/// model before accepting it.
async fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedding_backend {
        EmbeddingBackend::Hash => Ok(Arc::new(HashEmbedder::new(config.embedding_dimension)?)),
        EmbeddingBackend::Remote => {
            let url = config
                .embedding_url
                .clone()
                .context("EMBEDDING_URL is required for the remote backend")?;
            info!("Connecting to embedding service at {url} (model: {})", config.embedding_model);
            let embedder = RemoteEmbedder::connect(RemoteEmbedderConfig {
                url,
                model: config.embedding_model.clone(),
                api_key: config.embedding_api_key.clone(),
                dimension: Some(config.embedding_dimension),
            })
            .await
            .context("embedding service is unusable")?;
            Ok(Arc::new(embedder))
        }
        EmbeddingBackend::Minilm => {
            info!(
                "Loading local encoder {}@{}",
                config.embedding_model, config.embedding_revision
            );
            let minilm_config = MiniLmEmbedderConfig {
                model: config.embedding_model.clone(),
                revision: config.embedding_revision.clone(),
                dimension: Some(config.embedding_dimension),
            };
            let embedder = tokio::task::spawn_blocking(move || MiniLmEmbedder::load(minilm_config))
                .await?
                .context("local encoder is unusable")?;
            Ok(Arc::new(embedder))
        }
    }
}
