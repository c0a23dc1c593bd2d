//! Per-request orchestration: uploaded file in, diagnosis out.
//!
//! ```text
//! received ─▶ validated ─▶ decoded ─▶ inference-requested ─▶ normalized
//! ```
//!
//! Every stage returns `Result<_, LeafScanError>` and the first failure ends
//! the request. Validation and decoding both happen before the VLM is
//! called.

use crate::config::ServiceConfig;
use crate::error::LeafScanError;
use crate::output::DiagnosisResult;
use crate::pipeline::decode::{decode_image, DecodedImage};
use crate::pipeline::llm::{generate_with_timeout, InferenceClient};
use crate::pipeline::normalize::{parse_diagnosis, preview};
use crate::pipeline::validate::UploadedFile;
use crate::prompts::DIAGNOSIS_PROMPT;
use std::time::Instant;
use tracing::{debug, info};

/// Diagnose the plant disease shown in an uploaded photo.
///
/// # Errors
/// * Client errors: wrong file type, empty upload, undecodable image.
/// * Service errors: VLM failure or timeout, reply that is not a complete
///   diagnosis.
pub async fn diagnose(
    file: UploadedFile,
    client: &dyn InferenceClient,
    config: &ServiceConfig,
) -> Result<DiagnosisResult, LeafScanError> {
    let start = Instant::now();

    // ── Step 1: Validate ─────────────────────────────────────────────────
    file.validate()?;
    debug!(
        "Accepted upload {:?} ({:?}, {} bytes)",
        file.filename,
        file.content_type,
        file.bytes.len()
    );

    // ── Step 2: Decode ───────────────────────────────────────────────────
    let image = decode_blocking(file.bytes, config.max_image_dimension).await?;

    // ── Step 3: Inference ────────────────────────────────────────────────
    info!("Sending {}x{} image to the VLM", image.width(), image.height());
    let raw =
        generate_with_timeout(client, DIAGNOSIS_PROMPT, &image, config.api_timeout()).await?;
    drop(image);
    info!("VLM response received: {}", preview(&raw));

    // ── Step 4: Normalize ────────────────────────────────────────────────
    let result = parse_diagnosis(&raw)?;
    info!(
        "Diagnosis '{}' in {}ms",
        result.disease,
        start.elapsed().as_millis()
    );
    Ok(result)
}

/// Decode on the blocking pool so large photos don't stall the runtime.
async fn decode_blocking(
    bytes: Vec<u8>,
    max_dimension: u32,
) -> Result<DecodedImage, LeafScanError> {
    tokio::task::spawn_blocking(move || decode_image(&bytes, max_dimension))
        .await
        .map_err(|e| LeafScanError::Internal(format!("Decode task failed: {e}")))?
}
