//! HTTP integration tests for edgequake-leafscan.
//!
//! The VLM is replaced by a stub [`InferenceClient`] returning a canned
//! reply, so these tests run offline. Test images are generated in memory.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use edgequake_leafscan::{
    router, AppState, DecodedImage, InferenceClient, LeafScanError, ServiceConfig, SERVICE_NAME,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

const LEAF_SPOT: &str =
    r#"{"disease":"Leaf Spot","cause":"Fungal infection","treatment":"Apply fungicide"}"#;

/// Stub VLM that returns a fixed reply and counts calls.
struct StubClient {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl StubClient {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceClient for StubClient {
    async fn generate(
        &self,
        _prompt: &str,
        _image: &DecodedImage,
    ) -> Result<String, LeafScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(|message| LeafScanError::InferenceFailed { message })
    }
}

fn server_with(client: Arc<StubClient>, config: ServiceConfig) -> TestServer {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let app = router(AppState::new(config, client));
    TestServer::new(app).unwrap()
}

fn server(client: Arc<StubClient>) -> TestServer {
    server_with(client, ServiceConfig::default())
}

fn leaf_image(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(32, 32, |x, y| {
        if (x + y) % 7 == 0 {
            Rgb([120, 80, 20])
        } else {
            Rgb([40, 150, 50])
        }
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

fn upload(bytes: Vec<u8>, filename: &str, mime: &str) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(filename).mime_type(mime))
}

fn detail(body: &Value) -> &str {
    body["detail"].as_str().unwrap_or_default()
}

// ── Metadata routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn root_lists_endpoints() {
    let server = server(StubClient::replying(LEAF_SPOT));
    let response = server.get("/").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["message"], SERVICE_NAME);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["docs"], "/docs");
    assert_eq!(body["endpoints"]["predict_disease"], "POST /predict-disease");
}

#[tokio::test]
async fn health_reports_healthy() {
    let server = server(StubClient::replying(LEAF_SPOT));
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy", "service": SERVICE_NAME }));
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let server = server(StubClient::replying(LEAF_SPOT));
    let response = server.get("/openapi.json").await;
    response.assert_status_ok();

    let doc: Value = response.json();
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(doc["info"]["title"], SERVICE_NAME);

    let predict = &doc["paths"]["/predict-disease"]["post"];
    assert!(predict["requestBody"]["content"]["multipart/form-data"].is_object());
    for status in ["200", "400", "413", "500"] {
        assert!(predict["responses"][status].is_object(), "missing {status}");
    }
    assert!(doc["paths"]["/health"]["get"].is_object());
    assert!(doc["paths"]["/"]["get"].is_object());

    let schemas = &doc["components"]["schemas"];
    assert_eq!(
        schemas["DiagnosisResult"]["required"],
        json!(["disease", "cause", "treatment"])
    );
    assert!(schemas["ErrorBody"]["properties"]["detail"].is_object());
    assert_eq!(schemas["UploadForm"]["properties"]["file"]["format"], "binary");
}

#[tokio::test]
async fn docs_page_renders_openapi() {
    let server = server(StubClient::replying(LEAF_SPOT));
    let response = server.get("/docs").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("<html") || html.contains("<!doctype html"));
    assert!(html.contains("/predict-disease"));
}

// ── Successful diagnosis ─────────────────────────────────────────────────────

#[tokio::test]
async fn jpeg_leaf_returns_diagnosis() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let response = server
        .post("/predict-disease")
        .multipart(upload(leaf_image(ImageFormat::Jpeg), "leaf.jpg", "image/jpeg"))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "disease": "Leaf Spot",
        "cause": "Fungal infection",
        "treatment": "Apply fungicide"
    }));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn fenced_reply_is_normalised() {
    let client = StubClient::replying(&format!("```json\n{LEAF_SPOT}\n```"));
    let server = server(client);

    let response = server
        .post("/predict-disease")
        .multipart(upload(leaf_image(ImageFormat::Png), "LEAF.PNG", "image/png"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["disease"], "Leaf Spot");
    assert_eq!(body.as_object().map(|m| m.len()), Some(3));
}

#[tokio::test]
async fn extra_multipart_fields_are_ignored() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client);

    let form = MultipartForm::new().add_text("note", "from the greenhouse").add_part(
        "file",
        Part::bytes(leaf_image(ImageFormat::Jpeg))
            .file_name("leaf.jpeg")
            .mime_type("image/jpeg"),
    );
    let response = server.post("/predict-disease").multipart(form).await;
    response.assert_status_ok();
}

// ── Client errors ────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_named_jpg_is_rejected_before_inference() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let response = server
        .post("/predict-disease")
        .multipart(upload(b"%PDF-1.7\n...".to_vec(), "photo.jpg", "application/pdf"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        detail(&body),
        "Invalid file type. Please upload a JPG, JPEG, or PNG image."
    );
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn png_named_text_file_is_rejected() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let response = server
        .post("/predict-disease")
        .multipart(upload(leaf_image(ImageFormat::Png), "leaf.png", "text/plain"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn wrong_extension_is_rejected() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let response = server
        .post("/predict-disease")
        .multipart(upload(leaf_image(ImageFormat::Png), "leaf.gif", "image/png"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let response = server
        .post("/predict-disease")
        .multipart(upload(Vec::new(), "leaf.png", "image/png"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(detail(&body), "Empty file uploaded");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn corrupt_image_is_rejected() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let mut bytes = leaf_image(ImageFormat::Png);
    bytes.truncate(40);
    let response = server
        .post("/predict-disease")
        .multipart(upload(bytes, "leaf.png", "image/png"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(detail(&body), "Invalid image file");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn missing_file_part_is_rejected() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let form = MultipartForm::new().add_text("image", "nothing here");
    let response = server.post("/predict-disease").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(detail(&body).contains("'file'"));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn non_multipart_body_is_rejected() {
    let client = StubClient::replying(LEAF_SPOT);
    let server = server(client.clone());

    let response = server
        .post("/predict-disease")
        .json(&json!({ "file": "leaf.jpg" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let client = StubClient::replying(LEAF_SPOT);
    let config = ServiceConfig::builder().max_upload_bytes(1024).build().unwrap();
    let server = server_with(client.clone(), config);

    let response = server
        .post("/predict-disease")
        .multipart(upload(vec![0xAB; 64 * 1024], "leaf.png", "image/png"))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(client.calls(), 0);
}

// ── Service errors ───────────────────────────────────────────────────────────

#[tokio::test]
async fn prose_reply_is_a_server_error() {
    let server = server(StubClient::replying("I cannot determine this."));

    let response = server
        .post("/predict-disease")
        .multipart(upload(leaf_image(ImageFormat::Jpeg), "leaf.jpg", "image/jpeg"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(detail(&body), "Failed to parse AI response");
}

#[tokio::test]
async fn incomplete_reply_names_missing_field() {
    let server = server(StubClient::replying(r#"{"disease":"X","cause":"Y"}"#));

    let response = server
        .post("/predict-disease")
        .multipart(upload(leaf_image(ImageFormat::Jpeg), "leaf.jpg", "image/jpeg"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(detail(&body), "AI response missing required field: treatment");
}

#[tokio::test]
async fn upstream_failure_does_not_leak_detail() {
    let server = server(StubClient::failing("403 API key AIza-secret invalid"));

    let response = server
        .post("/predict-disease")
        .multipart(upload(leaf_image(ImageFormat::Jpeg), "leaf.jpg", "image/jpeg"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(!detail(&body).contains("AIza-secret"));
    assert!(detail(&body).starts_with("AI service error"));
}
