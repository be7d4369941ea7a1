//! API route handlers.

use std::sync::Arc;

use argus_core::{AnalysisError, AnalysisOptions, Analyzer, FamilyReport};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, RequestFailure, Result};
use crate::models::{
    allowed_file, parse_flag, AnalyzeResponse, Components, FamilyResponse, HealthResponse,
    OcrComponent, Upload, UploadedFile,
};
use crate::prometheus;
use crate::state::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

type Handled<T> = std::result::Result<Json<T>, RequestFailure>;

/// GET /v1/health - Liveness and component information.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        uptime_seconds: state.metrics().uptime().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
        components: Components {
            ocr: OcrComponent {
                status: "configured",
                engine: state.analyzer.ocr_engine_name(),
            },
        },
    })
}

/// GET /v1/metrics - Counters in Prometheus text format.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = prometheus::render(&state.metrics().snapshot());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::CONTENT_TYPE)],
        body,
    )
}

/// POST /v1/analyze - Full analysis with optional redaction and summary.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Handled<AnalyzeResponse> {
    let request_id = new_request_id();
    full_analysis(state, headers, multipart)
        .await
        .map(Json)
        .map_err(|e| reject(e, request_id))
}

/// POST /v1/analyze/nsfw - NSFW classification only.
pub async fn analyze_nsfw(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Handled<FamilyResponse<argus_core::NsfwResult>> {
    let request_id = new_request_id();
    single_family(state, headers, multipart, |analyzer, bytes| {
        analyzer.analyze_nsfw(bytes)
    })
    .await
    .map(Json)
    .map_err(|e| reject(e, request_id))
}

/// POST /v1/analyze/games - Game detection only.
pub async fn analyze_games(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Handled<FamilyResponse<argus_core::GameResult>> {
    let request_id = new_request_id();
    single_family(state, headers, multipart, |analyzer, bytes| {
        analyzer.analyze_games(bytes)
    })
    .await
    .map(Json)
    .map_err(|e| reject(e, request_id))
}

/// POST /v1/analyze/ocr - Text, URL and software extraction only.
pub async fn analyze_ocr(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Handled<FamilyResponse<argus_core::OcrResult>> {
    let request_id = new_request_id();
    single_family(state, headers, multipart, |analyzer, bytes| {
        analyzer.analyze_text(bytes)
    })
    .await
    .map(Json)
    .map_err(|e| reject(e, request_id))
}

async fn full_analysis(
    state: AppState,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<AnalyzeResponse> {
    let (file, options) = accept_upload(&state, &headers, multipart).await?;
    debug!(
        filename = %file.filename,
        bytes = file.bytes.len(),
        blur = options.blur_enabled,
        summary = options.include_summary,
        "analyzing upload"
    );

    let analyzer = Arc::clone(&state.analyzer);
    let UploadedFile { filename, bytes } = file;
    let (report, image_base64) = tokio::task::spawn_blocking(move || {
        let report = analyzer.analyze(&bytes, &options)?;
        let encoded = report.blur_info.as_ref().and_then(|blur| match blur.encode_png() {
            Ok(png) => Some(BASE64.encode(png)),
            Err(e) => {
                warn!(error = %e, "could not encode redacted image");
                None
            }
        });
        Ok::<_, AnalysisError>((report, encoded))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(AnalyzeResponse::new(report, filename, image_base64))
}

async fn single_family<T, F>(
    state: AppState,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
    run: F,
) -> Result<FamilyResponse<T>>
where
    T: Send + 'static,
    F: FnOnce(&Analyzer, &[u8]) -> std::result::Result<FamilyReport<T>, AnalysisError>
        + Send
        + 'static,
{
    let (file, _) = accept_upload(&state, &headers, multipart).await?;
    let analyzer = Arc::clone(&state.analyzer);
    let report = tokio::task::spawn_blocking(move || run(&analyzer, &file.bytes))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(report.into())
}

/// Reads the form, checks the API key, then validates the image field.
async fn accept_upload(
    state: &AppState,
    headers: &HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(UploadedFile, AnalysisOptions)> {
    let multipart = multipart.map_err(|_| ApiError::MissingImage)?;
    let upload = read_upload(multipart).await?;
    authorize(state, headers, upload.api_key.as_deref())?;

    let file = upload.image.ok_or(ApiError::MissingImage)?;
    if file.filename.is_empty() {
        return Err(ApiError::NoFileSelected);
    }
    if !allowed_file(&file.filename) {
        return Err(ApiError::InvalidFileType);
    }
    Ok((file, upload.options))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload.image = Some(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "blur_enabled" => {
                upload.options.blur_enabled = parse_flag(&field.text().await.map_err(multipart_error)?)
            }
            "include_summary" => {
                upload.options.include_summary =
                    parse_flag(&field.text().await.map_err(multipart_error)?)
            }
            "sensitivity_level" => {
                upload.options.sensitivity_level = field.text().await.map_err(multipart_error)?
            }
            "api_key" => upload.api_key = Some(field.text().await.map_err(multipart_error)?),
            other => debug!(field = other, "ignoring form field"),
        }
    }

    Ok(upload)
}

fn authorize(state: &AppState, headers: &HeaderMap, form_key: Option<&str>) -> Result<()> {
    if !state.requires_api_key() {
        return Ok(());
    }
    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(form_key)
        .filter(|k| !k.is_empty())
        .ok_or(ApiError::ApiKeyRequired)?;
    if state.api_keys.contains(key) {
        Ok(())
    } else {
        Err(ApiError::InvalidApiKey)
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::InvalidRequest(e.body_text())
    }
}

fn reject(error: ApiError, request_id: String) -> RequestFailure {
    let (status, code) = error.parts();
    if status.is_server_error() {
        warn!(%request_id, code, error = %error, "request failed");
    } else {
        info!(%request_id, code, "request rejected");
    }
    error.with_request_id(request_id)
}

fn new_request_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ana_{}{}", Utc::now().timestamp(), &suffix[..8])
}
