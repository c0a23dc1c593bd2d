//! Error type for the edgequake-leafscan service.
//!
//! Every failure in the request pipeline is a [`LeafScanError`], and every
//! variant belongs to exactly one [`ErrorClass`]:
//!
//! * **Client**: the caller sent something we cannot work with (wrong file
//!   type, empty upload, corrupt image bytes). Surfaced as a 4xx with the
//!   specific reason so the caller can fix the request.
//!
//! * **Service**: this service or the upstream VLM failed (API error,
//!   timeout, output that is not the JSON we asked for). Surfaced as a 500
//!   with a generic message; the specific cause goes to the log only.
//!
//! Validation failures are raised before the VLM is called, so a client
//! error never costs upstream quota.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({ "detail": "Empty file uploaded" }))]
pub struct ErrorBody {
    /// What went wrong, safe to show to the caller.
    pub detail: String,
}

/// Who is at fault for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input from the caller (4xx).
    Client,
    /// Upstream or internal failure (5xx).
    Service,
}

/// All errors produced by the edgequake-leafscan library.
#[derive(Debug, Error)]
pub enum LeafScanError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The multipart body had no `file` part.
    #[error("No file uploaded: expected a multipart field named 'file'")]
    MissingFile,

    /// The multipart body could not be parsed.
    #[error("Malformed multipart upload: {detail}")]
    MalformedUpload { detail: String },

    /// The upload exceeded the configured body limit.
    #[error("Uploaded file exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Filename extension or declared content-type is not on the allow-list.
    #[error("Invalid file type (filename: {filename:?}, content-type: {content_type:?})")]
    InvalidFileType {
        filename: Option<String>,
        content_type: Option<String>,
    },

    /// The file part was present but had no bytes.
    #[error("Empty file uploaded")]
    EmptyFile,

    /// The bytes could not be decoded as a JPEG or PNG image.
    #[error("Invalid image file: {detail}")]
    InvalidImage { detail: String },

    // ── Inference errors ──────────────────────────────────────────────────
    /// The configured provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The VLM call failed (network, quota, rejected request).
    #[error("AI service error: {message}")]
    InferenceFailed { message: String },

    /// The VLM call did not finish within the configured timeout.
    #[error("AI service call timed out after {secs}s")]
    InferenceTimeout { secs: u64 },

    // ── Response errors ───────────────────────────────────────────────────
    /// The VLM reply was not a JSON object.
    #[error("Failed to parse AI response: {detail}")]
    UnparseableResponse { detail: String },

    /// The VLM reply was JSON but lacked one of the required fields.
    #[error("AI response missing required field: {field}")]
    MissingField { field: &'static str },

    /// A required field was present but empty or not a string.
    #[error("AI response field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LeafScanError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LeafScanError::MissingFile
            | LeafScanError::MalformedUpload { .. }
            | LeafScanError::PayloadTooLarge { .. }
            | LeafScanError::InvalidFileType { .. }
            | LeafScanError::EmptyFile
            | LeafScanError::InvalidImage { .. } => ErrorClass::Client,
            LeafScanError::ProviderNotConfigured { .. }
            | LeafScanError::InferenceFailed { .. }
            | LeafScanError::InferenceTimeout { .. }
            | LeafScanError::UnparseableResponse { .. }
            | LeafScanError::MissingField { .. }
            | LeafScanError::InvalidField { .. }
            | LeafScanError::InvalidConfig(_)
            | LeafScanError::Internal(_) => ErrorClass::Service,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LeafScanError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => match self.class() {
                ErrorClass::Client => StatusCode::BAD_REQUEST,
                ErrorClass::Service => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// The message returned to the HTTP caller.
    ///
    /// Client errors say exactly what to fix. Service errors never echo
    /// upstream text back to the caller.
    pub fn user_message(&self) -> String {
        match self {
            LeafScanError::InvalidFileType { .. } => {
                "Invalid file type. Please upload a JPG, JPEG, or PNG image.".to_string()
            }
            LeafScanError::InvalidImage { .. } => "Invalid image file".to_string(),
            LeafScanError::MissingFile
            | LeafScanError::MalformedUpload { .. }
            | LeafScanError::PayloadTooLarge { .. }
            | LeafScanError::EmptyFile => self.to_string(),
            LeafScanError::InferenceFailed { .. } => {
                "AI service error. Please try again later.".to_string()
            }
            LeafScanError::InferenceTimeout { .. } => {
                "AI service timed out. Please try again later.".to_string()
            }
            LeafScanError::UnparseableResponse { .. } => "Failed to parse AI response".to_string(),
            LeafScanError::MissingField { field } => {
                format!("AI response missing required field: {field}")
            }
            LeafScanError::InvalidField { field, .. } => {
                format!("AI response field '{field}' is empty or invalid")
            }
            LeafScanError::ProviderNotConfigured { .. }
            | LeafScanError::InvalidConfig(_)
            | LeafScanError::Internal(_) => {
                "Internal server error. Please try again later.".to_string()
            }
        }
    }
}

impl IntoResponse for LeafScanError {
    fn into_response(self) -> Response {
        match self.class() {
            ErrorClass::Service => tracing::error!("Service error: {}", self),
            ErrorClass::Client => tracing::warn!("Rejected upload: {}", self),
        }

        let body = ErrorBody {
            detail: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
