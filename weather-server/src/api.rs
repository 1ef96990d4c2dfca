//! HTTP handlers and the mapping from domain errors to responses.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use weather_core::{ErrorKind, ServiceError, WeatherResult};

use crate::server::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// A `ServiceError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Only an unknown city is the caller's fault; everything else is opaque.
        let status = match self.0.kind() {
            ErrorKind::CityNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            detail: self.0.message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Unmatched paths keep the `{detail}` error shape.
pub async fn not_found() -> Response {
    let body = ErrorBody {
        detail: "Not Found".to_string(),
    };

    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to Weather API" }))
}

/// `GET /api/v1/weather/:city`
pub async fn get_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<WeatherResult>, ApiError> {
    info!("Weather requested for city: {city}");

    let result = state
        .provider
        .get_weather_for_city(&city)
        .await
        .inspect_err(|err| {
            info!("Weather lookup for '{city}' failed with {}: {err}", err.kind());
        })?;

    Ok(Json(result))
}
