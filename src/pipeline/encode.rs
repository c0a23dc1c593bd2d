//! Image encoding: `DecodedImage` → base64 PNG wrapped in `ImageData`.
//!
//! Multimodal chat APIs (Gemini, OpenAI, Anthropic) accept images as base64
//! payloads embedded in the JSON request body. PNG is lossless, so the RGB
//! buffer the decoder produced reaches the model unchanged.

use crate::error::LeafScanError;
use crate::pipeline::decode::DecodedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use std::io::Cursor;
use tracing::debug;

/// Encode a decoded upload as a base64 PNG ready for the VLM API.
pub fn encode_image(img: &DecodedImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.as_image()
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png"))
}

/// [`encode_image`] on the blocking pool. PNG compression of a full-size
/// photo is CPU-bound and would otherwise hold up an async worker.
pub async fn encode_blocking(img: &DecodedImage) -> Result<ImageData, LeafScanError> {
    let img = img.clone();
    tokio::task::spawn_blocking(move || encode_image(&img))
        .await
        .map_err(|e| LeafScanError::Internal(format!("Encode task failed: {e}")))?
        .map_err(|e| LeafScanError::Internal(format!("Image encoding failed: {e}")))
}
