use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body that has passed [`Validate`].
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| ValidationError::JsonParse(err.body_text()))?;

        value.validate().map_err(|e| ValidationError::Validation(e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

pub trait Validate {
    type Error: std::fmt::Display;

    fn validate(&self) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub enum ValidationError {
    JsonParse(String),
    Validation(String),
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "VALIDATION_ERROR",
                "message": self.to_string()
            }
        });

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::JsonParse(msg) => write!(f, "JSON parse error: {}", msg),
            ValidationError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Validate for crate::web::handlers::PredictRequest {
    type Error = String;

    fn validate(&self) -> Result<(), Self::Error> {
        match (&self.image, &self.pixels) {
            (Some(_), Some(_)) => {
                return Err("Provide either 'image' or 'pixels', not both".to_string())
            }
            (None, None) => return Err("One of 'image' or 'pixels' is required".to_string()),
            (Some(image), None) if image.trim().is_empty() => {
                return Err("Image data cannot be empty".to_string())
            }
            (None, Some(pixels)) => {
                if pixels.trim().is_empty() {
                    return Err("Pixel data cannot be empty".to_string());
                }
                if self.width.is_none() || self.height.is_none() {
                    return Err("'width' and 'height' are required with 'pixels'".to_string());
                }
            }
            _ => {}
        }

        Ok(())
    }
}

/// Caller-supplied `X-Request-ID`, or a fresh UUID.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("X-Request-ID")
            .and_then(|value| value.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(RequestId(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::handlers::PredictRequest;

    fn request(image: Option<&str>, pixels: Option<&str>, size: Option<u32>) -> PredictRequest {
        PredictRequest {
            image: image.map(str::to_string),
            pixels: pixels.map(str::to_string),
            width: size,
            height: size,
        }
    }

    #[test]
    fn exactly_one_source_is_required() {
        assert!(request(None, None, None).validate().is_err());
        assert!(request(Some("aGk="), Some("aGk="), Some(2)).validate().is_err());
        assert!(request(Some("aGk="), None, None).validate().is_ok());
    }

    #[test]
    fn raw_pixels_need_dimensions() {
        assert!(request(None, Some("AAAA"), None).validate().is_err());
        assert!(request(None, Some("AAAA"), Some(1)).validate().is_ok());
        assert!(request(None, Some("  "), Some(1)).validate().is_err());
    }
}
