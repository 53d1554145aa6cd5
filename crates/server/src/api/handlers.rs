use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use mediaconv_core::format::{self, canonicalize, Format, SupportedFormats};

use super::error::{bad_request, not_found, ApiError};
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct FormatParams {
    pub format: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversionParams {
    pub from_format: String,
    pub to_format: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// GET /supported-formats
pub async fn supported_formats() -> Json<SupportedFormats> {
    Json(format::supported_formats())
}

/// GET /supported-conversions?format=
///
/// Formats the given format may be converted to.
pub async fn supported_conversions(
    params: Result<Query<FormatParams>, QueryRejection>,
) -> Result<Json<Vec<Format>>, ApiError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;

    format::supported_conversions(&params.format)
        .map(Json)
        .ok_or_else(|| not_found(format!("Invalid format: {}", canonicalize(&params.format))))
}

/// GET /is-valid-conversion?from_format=&to_format=
pub async fn is_valid_conversion(
    params: Result<Query<ConversionParams>, QueryRejection>,
) -> Result<Json<bool>, ApiError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    Ok(Json(format::is_valid_conversion(
        &params.from_format,
        &params.to_format,
    )))
}
