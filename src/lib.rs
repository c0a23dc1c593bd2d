//! # edgequake-leafscan
//!
//! Diagnose plant leaf diseases from photos using Vision Language Models
//! (VLMs), served over HTTP.
//!
//! A caller uploads a leaf photo; the service checks it, decodes it to RGB,
//! asks a VLM (Gemini by default) for a diagnosis, and reshapes the model's
//! free-text answer into a fixed three-field JSON record.
//!
//! ## Pipeline Overview
//!
//! ```text
//! multipart upload
//!  │
//!  ├─ 1. Validate  extension + MIME allow-list, non-empty body
//!  ├─ 2. Decode    JPEG/PNG → RGB8 (spawn_blocking), downscale if huge
//!  ├─ 3. Encode    RGB8 → base64 PNG ImageData (spawn_blocking)
//!  ├─ 4. VLM       one call, bounded by a timeout, no retries
//!  ├─ 5. Normalize strip ```json fences, parse, check three fields
//!  └─ 6. Respond   {"disease", "cause", "treatment"}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_leafscan::{router, AppState, LlmInferenceClient, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment
//!     let config = ServiceConfig::default();
//!     let client = LlmInferenceClient::from_config(&config)?;
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     axum::serve(listener, router(AppState::new(config, Arc::new(client)))).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `leafscan` binary (clap + anyhow + dotenvy + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod diagnose;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use diagnose::diagnose;
pub use error::{ErrorBody, ErrorClass, LeafScanError};
pub use output::DiagnosisResult;
pub use pipeline::decode::DecodedImage;
pub use pipeline::llm::{InferenceClient, LlmInferenceClient};
pub use pipeline::validate::UploadedFile;
pub use server::{router, ApiDoc, AppState, SERVICE_NAME};
