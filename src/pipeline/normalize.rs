//! Response normalisation: VLM free text → [`DiagnosisResult`].
//!
//! Even when told "JSON only, no markdown", models regularly wrap the object
//! in ` ```json ... ``` ` fences. The fences are stripped first, then the
//! remainder must parse as a JSON object carrying all three fields.
//!
//! ## Fence rules
//!
//! Applied in this order, each at most once:
//! 1. trim whitespace
//! 2. strip a leading ` ```json `
//! 3. strip a trailing ` ``` `
//! 4. strip a leading bare ` ``` ` (covers untagged fences)
//! 5. trim again
//!
//! Text without fences passes through unchanged apart from trimming.

use crate::error::LeafScanError;
use crate::output::DiagnosisResult;
use serde_json::{Map, Value};
use tracing::debug;

/// Keys every diagnosis must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["disease", "cause", "treatment"];

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Strip markdown code fences from a VLM reply.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix(JSON_FENCE) {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix(FENCE) {
        s = rest;
    }
    if let Some(rest) = s.strip_prefix(FENCE) {
        s = rest;
    }
    s.trim()
}

/// Parse a raw VLM reply into a validated [`DiagnosisResult`].
///
/// Fails with [`LeafScanError::UnparseableResponse`] when the cleaned text is
/// not a JSON object, [`LeafScanError::MissingField`] when a key is absent,
/// and [`LeafScanError::InvalidField`] when a value is not a non-empty string.
pub fn parse_diagnosis(raw: &str) -> Result<DiagnosisResult, LeafScanError> {
    let cleaned = strip_code_fences(raw);

    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| LeafScanError::UnparseableResponse {
            detail: format!("{e}; response: {}", preview(raw)),
        })?;

    let Value::Object(map) = value else {
        return Err(LeafScanError::UnparseableResponse {
            detail: format!("expected a JSON object; response: {}", preview(raw)),
        });
    };

    for field in REQUIRED_FIELDS {
        if !map.contains_key(field) {
            return Err(LeafScanError::MissingField { field });
        }
    }

    let result = DiagnosisResult {
        disease: required_string(&map, "disease")?,
        cause: required_string(&map, "cause")?,
        treatment: required_string(&map, "treatment")?,
    };
    debug!("Parsed diagnosis: {:?}", result);
    Ok(result)
}

fn required_string(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<String, LeafScanError> {
    match map.get(field) {
        None => Err(LeafScanError::MissingField { field }),
        Some(Value::String(s)) if s.trim().is_empty() => Err(LeafScanError::InvalidField {
            field,
            reason: "value is empty".into(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(LeafScanError::InvalidField {
            field,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

/// First 200 characters of a reply, for log context.
pub(crate) fn preview(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX).collect();
        format!("{head}…")
    }
}
