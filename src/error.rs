use std::path::PathBuf;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

/// Failure to turn a checkpoint into a ready [`Predictor`](crate::predictor::Predictor).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("checkpoint not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("could not load model: {0}")]
    Model(String),

    #[error("model produces {found} classes but {expected} labels are configured")]
    ClassCount { expected: usize, found: usize },

    #[error("at least one class label is required")]
    NoLabels,
}

/// Failure inside a forward pass on an already loaded network.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("forward pass failed: {0}")]
    Forward(String),

    #[error("model returned {found} scores, expected {expected}")]
    OutputShape { expected: usize, found: usize },

    #[error("model returned a non-finite score for class {index}")]
    NonFinite { index: usize },
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unsupported file type. Please upload a JPEG/PNG/WEBP image.")]
    UnsupportedFileType,

    #[error("Invalid image file")]
    InvalidImage,

    #[error("No file uploaded")]
    MissingFile,

    #[error("File too large")]
    PayloadTooLarge,

    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    #[error("Inference error")]
    Inference(#[from] InferenceError),

    #[error("Internal server error")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(e: actix_multipart::MultipartError) -> Self {
        Self::Multipart(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedFileType
            | Self::InvalidImage
            | Self::MissingFile
            | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Inference(_) | Self::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(ApiError::UnsupportedFileType.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn inference_failures_are_server_errors() {
        let err = ApiError::from(InferenceError::Forward("boom".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_finite_scores_are_server_errors() {
        let err = ApiError::from(InferenceError::NonFinite { index: 0 });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn oversized_upload_maps_to_413() {
        assert_eq!(ApiError::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
