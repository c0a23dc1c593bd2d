//! HTTP surface: routes, shared state, multipart extraction.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | service metadata |
//! | `GET /health` | liveness probe |
//! | `GET /docs` | interactive API docs (Scalar) |
//! | `GET /openapi.json` | OpenAPI document |
//! | `POST /predict-disease` | multipart `file` upload → diagnosis |
//!
//! Handlers hold no mutable state. [`AppState`] carries the start-up config
//! and the injected inference client, both behind `Arc`.

use crate::config::ServiceConfig;
use crate::diagnose::diagnose;
use crate::error::{ErrorBody, LeafScanError};
use crate::output::DiagnosisResult;
use crate::pipeline::llm::InferenceClient;
use crate::pipeline::validate::UploadedFile;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

/// Human-readable service name reported by `/` and `/health`.
pub const SERVICE_NAME: &str = "Plant Disease Detection API";

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Response body of `GET /`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    /// Path of the interactive API docs.
    pub docs: String,
    pub endpoints: EndpointIndex,
}

/// Route summary embedded in [`ServiceInfo`].
#[derive(Debug, Serialize, ToSchema)]
pub struct EndpointIndex {
    pub predict_disease: String,
    pub health: String,
    pub docs: String,
}

/// Response body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "healthy")]
    pub status: String,
    pub service: String,
}

/// Multipart body of `POST /predict-disease`. Only used for the OpenAPI
/// document; the handler reads the parts directly.
#[derive(ToSchema)]
pub struct UploadForm {
    /// JPG, JPEG or PNG photo of a single plant leaf.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// OpenAPI document for the service, served at `/openapi.json` and rendered
/// at `/docs`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plant Disease Detection API",
        description = "Upload a photo of a plant leaf and get a diagnosis from a Vision Language Model."
    ),
    paths(root, health, predict_disease),
    components(schemas(
        DiagnosisResult,
        ErrorBody,
        ServiceInfo,
        EndpointIndex,
        HealthStatus,
        UploadForm
    )),
    tags((name = "diagnosis", description = "Leaf disease diagnosis"))
)]
pub struct ApiDoc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub client: Arc<dyn InferenceClient>,
}

impl AppState {
    pub fn new(config: ServiceConfig, client: Arc<dyn InferenceClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict-disease", post(predict_disease))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "diagnosis",
    summary = "Service metadata",
    responses((status = 200, description = "Service name, version and routes", body = ServiceInfo))
)]
async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs: "/docs".to_string(),
        endpoints: EndpointIndex {
            predict_disease: "POST /predict-disease".to_string(),
            health: "GET /health".to_string(),
            docs: "GET /docs".to_string(),
        },
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "diagnosis",
    summary = "Liveness check",
    responses((status = 200, description = "Service is up", body = HealthStatus))
)]
async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/predict-disease",
    tag = "diagnosis",
    summary = "Diagnose a leaf photo",
    description = "Upload a JPG, JPEG or PNG photo of a plant leaf in a multipart field named `file`. \
Photos that do not show a plant leaf return `disease = \"Unknown\"`, \
`cause = \"Not a valid plant leaf\"`, `treatment = \"N/A\"`.",
    request_body(
        content = UploadForm,
        content_type = "multipart/form-data",
        description = "Multipart form with the image in the `file` field"
    ),
    responses(
        (status = 200, description = "Diagnosis for the uploaded leaf", body = DiagnosisResult),
        (status = 400, description = "Wrong file type, empty file or unreadable image",
            body = ErrorBody),
        (status = 413, description = "Upload larger than the configured limit", body = ErrorBody),
        (status = 500, description = "AI service failure or unusable AI response", body = ErrorBody)
    )
)]
async fn predict_disease(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DiagnosisResult>, LeafScanError> {
    let multipart = multipart.map_err(|e| LeafScanError::MalformedUpload {
        detail: e.body_text(),
    })?;
    let file = read_upload(multipart, state.config.max_upload_bytes).await?;
    let result = diagnose(file, state.client.as_ref(), &state.config).await?;
    Ok(Json(result))
}

/// Pull the `file` part out of the multipart body. Other parts are skipped.
async fn read_upload(
    mut multipart: Multipart,
    limit: usize,
) -> Result<UploadedFile, LeafScanError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        return Ok(UploadedFile::new(filename, content_type, bytes.to_vec()));
    }
    Err(LeafScanError::MissingFile)
}

fn multipart_error(e: MultipartError, limit: usize) -> LeafScanError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        LeafScanError::PayloadTooLarge { limit }
    } else {
        LeafScanError::MalformedUpload {
            detail: e.body_text(),
        }
    }
}
