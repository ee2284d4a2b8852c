use crate::{
    image::{ImageLoader, SourceBitmap},
    recognition::{PredictOutcome, Prediction, Status},
    utils::error::DigitError,
    web::{
        extractors::{RequestId, ValidatedJson},
        AppState,
    },
    Result,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

/// JSON request body. Either an encoded image or raw canvas pixels.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Base64 PNG/JPEG/BMP/WebP, optionally as a data URL
    #[serde(default)]
    pub image: Option<String>,

    /// Base64 of tightly packed RGBA bytes, as returned by `getImageData`
    #[serde(default)]
    pub pixels: Option<String>,

    /// Canvas width, required with `pixels`
    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,
}

/// Response envelope shared by the predict endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }

    /// A failure that still carries a payload, e.g. the status text to show.
    pub fn failure(err: &DigitError, data: T, request_id: String) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(ApiError {
                code: err.error_code().to_string(),
                message: err.to_string(),
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Text to display to the user
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
}

/// Current status text and model readiness.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: Status,
    pub model_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

type PredictReply = (StatusCode, Json<ApiResponse<PredictResponse>>);

/// JSON canvas upload
pub async fn predict_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<PredictRequest>,
) -> Result<PredictReply> {
    tracing::info!(
        "Processing JSON predict request: request_id={}, raw_pixels={}",
        request_id,
        request.pixels.is_some()
    );

    let canvas_size = state.config.preprocess.canvas_size;
    let bitmap = match (request.image, request.pixels) {
        (Some(image), _) => {
            let decoded = ImageLoader::from_base64(&image)?;
            ImageLoader::to_source_bitmap(decoded, canvas_size)?
        }
        (None, Some(pixels)) => ImageLoader::from_rgba_base64(
            &pixels,
            request.width.unwrap_or_default(),
            request.height.unwrap_or_default(),
            canvas_size,
        )?,
        (None, None) => {
            return Err(DigitError::InvalidInput("No canvas data provided".to_string()))
        }
    };

    Ok(run_prediction(&state, bitmap, request_id).await)
}

/// Multipart file upload
pub async fn predict_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<PredictReply> {
    tracing::info!("Processing multipart predict request: request_id={}", request_id);

    let mut image_data = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        DigitError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return Err(DigitError::UnsupportedFormat(content_type.to_string()));
            }
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| DigitError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        if data.is_empty() {
            return Err(DigitError::InvalidInput("Empty file".to_string()));
        }

        tracing::debug!("Received file: {} bytes", data.len());
        image_data = Some(data);
    }

    let image_data =
        image_data.ok_or_else(|| DigitError::InvalidInput("No image file provided".to_string()))?;

    let decoded = ImageLoader::from_bytes(&image_data)?;
    let bitmap = ImageLoader::to_source_bitmap(decoded, state.config.preprocess.canvas_size)?;

    Ok(run_prediction(&state, bitmap, request_id).await)
}

/// The canvas was wiped; reset the status text.
pub async fn clear_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    state.session.clear();
    status_handler(State(state)).await
}

pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.session.status(),
        model_ready: state.session.is_ready(),
        load_error: state.session.load_error(),
    })
}

async fn run_prediction(state: &AppState, bitmap: SourceBitmap, request_id: String) -> PredictReply {
    let outcome = state.session.predict(bitmap).await;
    let status = outcome.status();

    match outcome {
        PredictOutcome::Predicted(prediction) => {
            tracing::info!(
                "Predict completed: request_id={}, label={}, time={:.3}ms",
                request_id,
                prediction.label,
                prediction.timings.total_ms
            );
            let body = PredictResponse {
                status,
                prediction: Some(prediction),
            };
            (StatusCode::OK, Json(ApiResponse::success(body, request_id)))
        }
        PredictOutcome::NotReady => {
            failure_reply(&DigitError::NotReady, status, request_id)
        }
        PredictOutcome::Failed(err) => failure_reply(&err, status, request_id),
    }
}

fn failure_reply(err: &DigitError, status: Status, request_id: String) -> PredictReply {
    let body = PredictResponse {
        status,
        prediction: None,
    };
    (
        err.status_code(),
        Json(ApiResponse::failure(err, body, request_id)),
    )
}
