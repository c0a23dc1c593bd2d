//! HTTP server binary for edgequake-leafscan.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ServiceConfig`, builds the VLM client and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_leafscan::{router, AppState, LlmInferenceClient, ServiceConfig};
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port with Gemini
  GEMINI_API_KEY=... leafscan

  # Different port and model
  leafscan --port 9000 --model gemini-2.5-pro

  # Use another vision provider
  OPENAI_API_KEY=sk-... leafscan --provider openai --model gpt-4.1-mini

  # Diagnose a photo
  curl -F "file=@leaf.jpg;type=image/jpeg" http://localhost:8000/predict-disease

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter, e.g. "edgequake_leafscan=debug"

  Variables may also be placed in a .env file in the working directory.
"#;

/// Serve plant leaf disease diagnosis over HTTP using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "leafscan",
    version,
    about = "Serve plant leaf disease diagnosis over HTTP using Vision LLMs",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Interface to bind.
    #[arg(long, env = "LEAFSCAN_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "LEAFSCAN_PORT", default_value_t = 8000)]
    port: u16,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Vision model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL", default_value = "gemini-2.5-flash")]
    model: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "LEAFSCAN_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per diagnosis.
    #[arg(long, env = "LEAFSCAN_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Per-request LLM call timeout in seconds.
    #[arg(long, env = "LEAFSCAN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Maximum upload size in megabytes.
    #[arg(long, env = "LEAFSCAN_MAX_UPLOAD_MB", default_value_t = 10)]
    max_upload_mb: usize,

    /// Longest image side forwarded to the model, in pixels.
    #[arg(long, env = "LEAFSCAN_MAX_IMAGE_DIMENSION", default_value_t = 2048)]
    max_image_dimension: u32,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LEAFSCAN_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap so its env fallbacks see the values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    let config = ServiceConfig::builder()
        .host(cli.host)
        .port(cli.port)
        .provider_name(cli.provider)
        .model(cli.model)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024))
        .max_image_dimension(cli.max_image_dimension)
        .build()
        .context("Invalid configuration")?;

    let client =
        LlmInferenceClient::from_config(&config).context("Failed to initialise the LLM provider")?;

    // ── Serve ────────────────────────────────────────────────────────────
    let addr = config.bind_addr();
    let app = router(AppState::new(config, Arc::new(client)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
