use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpResponse};
use futures_util::TryStreamExt;
use image::DynamicImage;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{HealthResponse, HealthStatus, MessageResponse, PredictionResponse, PredictionResult},
    predictor::PredictorState,
};

/// Declared content types accepted by `POST /predict`, matched verbatim
/// (no parameters, no case folding). The bytes are not sniffed.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/jpg", "image/webp"];

const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    pub predictor: PredictorState,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(predictor: PredictorState, max_upload_bytes: usize) -> Self {
        Self {
            predictor,
            max_upload_bytes,
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: "Brain Tumor Detection API is running".to_string(),
    })
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let response = match &state.predictor {
        PredictorState::Ready(_) => HealthResponse {
            status: HealthStatus::Ready,
            model_loaded: true,
            reason: None,
        },
        PredictorState::Unavailable(reason) => HealthResponse {
            status: HealthStatus::Degraded,
            model_loaded: false,
            reason: Some(reason.clone()),
        },
    };

    HttpResponse::Ok().json(response)
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn predict(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let contents = read_upload(payload, state.max_upload_bytes).await?;
    tracing::debug!(bytes = contents.len(), "received upload");

    let image = web::block(move || decode(&contents)).await??;

    let result = match &state.predictor {
        PredictorState::Ready(predictor) => {
            let predictor = Arc::clone(predictor);
            web::block(move || predictor.predict(&image))
                .await?
                .map_err(|e| {
                    tracing::error!(error = %e, "inference failed");
                    ApiError::from(e)
                })?
        }
        PredictorState::Unavailable(_) => {
            tracing::debug!("no model loaded, returning stub prediction");
            PredictionResult::stub()
        }
    };

    tracing::info!(class = %result.label, confidence = result.confidence, "prediction complete");

    Ok(HttpResponse::Ok().json(PredictionResponse::from(result)))
}

/// Read the `file` field, checking its declared type before buffering any bytes.
async fn read_upload(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, ApiError> {
    while let Some(mut field) = payload.try_next().await? {
        if field.content_disposition().get_name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            tracing::debug!(content_type, "rejected upload");
            return Err(ApiError::UnsupportedFileType);
        }

        let mut contents = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if contents.len() + chunk.len() > limit {
                return Err(ApiError::PayloadTooLarge);
            }
            contents.extend_from_slice(&chunk);
        }

        return Ok(contents);
    }

    Err(ApiError::MissingFile)
}

fn decode(contents: &[u8]) -> Result<DynamicImage, ApiError> {
    image::load_from_memory(contents)
        .map(|image| DynamicImage::ImageRgb8(image.to_rgb8()))
        .map_err(|e| {
            tracing::debug!(error = %e, "could not decode upload");
            ApiError::InvalidImage
        })
}
