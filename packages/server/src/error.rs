//! Server error taxonomy and its HTTP mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use hotspot_map_analysis::AnalysisError;
use hotspot_map_dataset::DatasetError;
use hotspot_map_predictor::PredictError;
use hotspot_map_render::RenderError;
use hotspot_map_server_models::ApiError;
use thiserror::Error;

/// Errors surfaced by startup and request handling.
///
/// Startup variants abort the process before the server binds. Request
/// variants discard the in-progress render; nothing is retried.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The location table could not be loaded (startup).
    #[error("Failed to load location table: {0}")]
    Dataset(#[from] DatasetError),

    /// The model could not be loaded (startup).
    #[error("Failed to load model: {0}")]
    Model(#[from] PredictError),

    /// Classification config or month setup is invalid (startup).
    #[error("Invalid classification setup: {0}")]
    Config(#[source] AnalysisError),

    /// The requested month is not registered.
    #[error("Unknown month '{0}'")]
    BadRequest(String),

    /// Labeling failed (missing column, bad features, model error).
    #[error("Inference failed: {0}")]
    Inference(#[source] AnalysisError),

    /// Rendering or writing the map failed.
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    /// The blocking render task was cancelled.
    #[error("Render task was cancelled")]
    Blocking,

    /// Binding or running the HTTP server failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AnalysisError> for ServerError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::UnknownMonth(month) => Self::BadRequest(month),
            other => Self::Inference(other),
        }
    }
}

impl From<actix_web::error::BlockingError> for ServerError {
    fn from(_: actix_web::error::BlockingError) -> Self {
        Self::Blocking
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{self}");
        }
        HttpResponse::build(self.status_code()).json(ApiError {
            error: self.to_string(),
        })
    }
}
