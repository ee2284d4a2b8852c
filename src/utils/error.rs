use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model not ready")]
    NotReady,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unexpected bitmap size: {width}x{height}, expected {expected}x{expected}")]
    BitmapSize {
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DigitError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DigitError::InvalidInput(_) | DigitError::BitmapSize { .. } => StatusCode::BAD_REQUEST,
            DigitError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            DigitError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DigitError::Base64(_) | DigitError::ImageDecode(_) => {
                StatusCode::BAD_REQUEST
            }
            DigitError::ModelLoad(_) | DigitError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DigitError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            DigitError::NotReady => "MODEL_NOT_READY",
            DigitError::Inference(_) => "INFERENCE_ERROR",
            DigitError::InvalidInput(_) => "INVALID_INPUT",
            DigitError::BitmapSize { .. } => "INVALID_BITMAP_SIZE",
            DigitError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            DigitError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            DigitError::Config(_) => "CONFIG_ERROR",
            DigitError::Io(_) => "IO_ERROR",
            DigitError::Base64(_) => "BASE64_DECODE_ERROR",
            DigitError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            DigitError::Ort(_) => "ORT_ERROR",
            DigitError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for DigitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        tracing::error!("Request failed: {} ({})", self, status);

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_size_is_a_client_error() {
        let err = DigitError::BitmapSize {
            width: 100,
            height: 80,
            expected: 280,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_BITMAP_SIZE");
        assert_eq!(
            err.to_string(),
            "Unexpected bitmap size: 100x80, expected 280x280"
        );
    }

    #[test]
    fn io_errors_are_server_side() {
        let err = DigitError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.error_code(), "IO_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn model_failures_map_to_unavailable() {
        assert_eq!(
            DigitError::ModelLoad("missing".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(DigitError::NotReady.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            DigitError::Inference("shape".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
