use crate::error::OcrError;
use crate::ocr::{self, TextExtractor};
use crate::service::ApiError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Multipart framing allowance on top of the largest accepted image
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state of the OCR API
#[derive(Clone)]
pub struct OcrState {
    engine: Arc<dyn TextExtractor>,
    max_upload_bytes: usize,
}

impl OcrState {
    pub fn new(engine: Arc<dyn TextExtractor>, max_upload_bytes: usize) -> Self {
        Self {
            engine,
            max_upload_bytes,
        }
    }
}

pub fn ocr_router(state: OcrState) -> Router {
    let body_limit = state.max_upload_bytes + FORM_OVERHEAD_BYTES;
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/upload-ocr", post(upload_ocr))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "OCR API running" }))
}

async fn health(State(state): State<OcrState>) -> Json<Value> {
    let engine = if state.engine.is_available().await {
        "available"
    } else {
        "unavailable"
    };
    Json(json!({ "status": "ok", "tesseract": engine }))
}

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub error: Option<String>,
}

/// An uploaded image with its declared content type
struct Upload {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?;
        return Ok(Upload {
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::BadRequest("No file was uploaded".to_string()))
}

async fn upload_ocr(
    State(state): State<OcrState>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, ApiError> {
    let upload = read_upload(multipart).await?;

    let content_type = upload.content_type.unwrap_or_default();
    if !ocr::is_supported_content_type(&content_type) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported format. Only allowed: {}",
            ocr::SUPPORTED_CONTENT_TYPES.join(", ")
        )));
    }

    if upload.bytes.is_empty() {
        return Err(ApiError::BadRequest("The file is empty".to_string()));
    }
    if upload.bytes.len() > state.max_upload_bytes {
        return Err(ApiError::BadRequest(format!(
            "The file exceeds the {} byte limit",
            state.max_upload_bytes
        )));
    }
    let upload_len = upload.bytes.len();
    let image = tokio::task::spawn_blocking(move || ocr::prepare_image(&upload.bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Image preprocessing aborted: {}", e)))?
        .map_err(ocr_error)?;

    ::log::info!(
        "Running OCR on a {} byte {} ({} bytes after grayscale)",
        upload_len,
        content_type,
        image.len()
    );
    let raw = state.engine.extract_text(&image).await.map_err(ocr_error)?;

    let text = ocr::clean_text(&raw);
    if text.is_empty() {
        return Ok(Json(OcrResponse {
            text,
            error: Some("No legible text detected. Try another image.".to_string()),
        }));
    }

    Ok(Json(OcrResponse { text, error: None }))
}

fn ocr_error(error: OcrError) -> ApiError {
    match error {
        OcrError::InvalidImage(e) => {
            ::log::warn!("Rejected upload: {}", e);
            ApiError::BadRequest("Could not open the image. Is it damaged or badly encoded?".to_string())
        }
        OcrError::Unavailable(_) => {
            ApiError::Internal("Tesseract is not installed correctly".to_string())
        }
        OcrError::Failed(_) => ApiError::Internal("Error extracting text from the image".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use std::io::Cursor;
    use std::sync::Mutex;

    const BOUNDARY: &str = "XBOUNDARYX";

    /// White 16x16 RGB image
    fn png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(16, 16, image::Rgb([255, 255, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Returns canned text or a canned failure
    enum FakeEngine {
        Text(&'static str),
        Missing,
        Broken,
        Recording(Mutex<Vec<Vec<u8>>>),
    }

    #[async_trait]
    impl TextExtractor for FakeEngine {
        async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
            match self {
                FakeEngine::Recording(seen) => {
                    seen.lock().unwrap().push(image.to_vec());
                    Ok("TOTAL".to_string())
                }
                FakeEngine::Text(text) => Ok(text.to_string()),
                FakeEngine::Missing => Err(OcrError::Unavailable("not found".into())),
                FakeEngine::Broken => Err(OcrError::Failed("crash".into())),
            }
        }

        async fn is_available(&self) -> bool {
            !matches!(self, FakeEngine::Missing)
        }
    }

    fn app(engine: FakeEngine) -> Router {
        app_with(Arc::new(engine))
    }

    fn app_with(engine: Arc<FakeEngine>) -> Router {
        ocr_router(OcrState::new(engine, 4096))
    }

    fn upload(field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"receipt\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/upload-ocr")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upload_returns_cleaned_text() {
        let engine = FakeEngine::Text("  SUPERMERCADO  \n\n TOTAL 12.50\n");
        let (status, body) = send(app(engine), upload("file", "image/png", &png())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "SUPERMERCADO\nTOTAL 12.50");
        assert!(body["error"].is_null());
    }

    #[tokio::test]
    async fn test_blank_result_is_reported() {
        let engine = FakeEngine::Text(" \n \n");
        let (status, body) = send(app(engine), upload("file", "image/png", &png())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "");
        assert!(body["error"].as_str().unwrap().contains("No legible text"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_uploads() {
        let (status, body) =
            send(app(FakeEngine::Text("x")), upload("file", "image/gif", b"GIF89a")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Unsupported format"));

        let (status, body) = send(app(FakeEngine::Text("x")), upload("file", "image/png", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "The file is empty");

        let (status, body) =
            send(app(FakeEngine::Text("x")), upload("file", "image/jpeg", b"not a jpeg")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Could not open"));

        let (status, _) = send(app(FakeEngine::Text("x")), upload("other", "image/png", &png())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut large = png();
        large.extend_from_slice(&[0u8; 8192]);
        let (status, _) = send(app(FakeEngine::Text("x")), upload("file", "image/png", &large)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_corrupt_image_is_rejected_before_the_engine() {
        let engine = Arc::new(FakeEngine::Recording(Mutex::new(Vec::new())));
        let corrupt = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x01, 0x02, 0x03];

        let (status, body) = send(app_with(engine.clone()), upload("file", "image/png", &corrupt)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Could not open"));
        let FakeEngine::Recording(seen) = engine.as_ref() else { unreachable!() };
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engine_receives_grayscale_png() {
        let engine = Arc::new(FakeEngine::Recording(Mutex::new(Vec::new())));

        let (status, body) = send(app_with(engine.clone()), upload("file", "image/png", &png())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "TOTAL");
        let FakeEngine::Recording(seen) = engine.as_ref() else { unreachable!() };
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let decoded = image::load_from_memory(&seen[0]).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[tokio::test]
    async fn test_engine_failures_are_internal_errors() {
        let missing = FakeEngine::Missing;
        let (status, body) = send(app(missing), upload("file", "image/png", &png())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Tesseract is not installed correctly");

        let broken = FakeEngine::Broken;
        let (status, _) = send(app(broken), upload("file", "image/png", &png())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_reports_engine() {
        let health = || Request::get("/health").body(Body::empty()).unwrap();

        let (_, body) = send(app(FakeEngine::Text("x")), health()).await;
        assert_eq!(body["tesseract"], "available");

        let missing = FakeEngine::Missing;
        let (_, body) = send(app(missing), health()).await;
        assert_eq!(body["tesseract"], "unavailable");
    }
}
