//! Upload, convert and download handlers.

use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State,
    },
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use mediaconv_core::conversion::{ConvertOutcome, Download, UploadOutcome, UploadedFile};
use mediaconv_core::format::{canonicalize, parse_format};

use super::error::{api_error, bad_request, not_found, service_error, ApiError};
use crate::state::AppState;

/// Multipart field carrying uploaded files.
const FILES_FIELD: &str = "files";

/// Response header naming the downloaded file.
pub const FILENAME_HEADER: HeaderName = HeaderName::from_static("filename");

const ZIP_CONTENT_TYPE: &str = "application/x-zip-compressed";

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionParams {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub session_id: String,
    pub to_format: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /upload?session_id=
///
/// Replace the session's files with the `files` parts of the form. Pass
/// `session_id=new` to start a session.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SessionParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadOutcome>, ApiError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text()))?;

    let mut files = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(api_error(e.status(), e.body_text())),
        };

        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let contents = field
            .bytes()
            .await
            .map_err(|e| api_error(e.status(), e.body_text()))?;
        debug!(file_name = %name, bytes = contents.len(), "Received upload part");

        files.push(UploadedFile {
            name,
            contents: contents.to_vec(),
        });
    }

    state
        .service()
        .upload(&params.session_id, files)
        .await
        .map(Json)
        .map_err(service_error)
}

/// PATCH /convert?session_id=&to_format=
///
/// Convert every pending file of the session.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ConvertParams>, QueryRejection>,
) -> Result<Json<ConvertOutcome>, ApiError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;

    if parse_format(&params.to_format).is_none() {
        return Err(not_found(format!(
            "Invalid to_format: {}",
            canonicalize(&params.to_format)
        )));
    }

    state
        .service()
        .convert(&params.session_id, &params.to_format)
        .await
        .map(Json)
        .map_err(service_error)
}

/// GET /download?session_id=
///
/// The single converted file as-is, or a zip when there are several.
pub async fn download(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SessionParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| bad_request(e.body_text()))?;

    let download = state
        .service()
        .download(&params.session_id)
        .await
        .map_err(service_error)?;

    download_response(download)
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_bytes(value.as_bytes()).map_err(|_| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("File name '{}' cannot be sent as a header", value.escape_default()),
        )
    })
}

fn download_response(download: Download) -> Result<Response, ApiError> {
    let builder = Response::builder().status(StatusCode::OK);

    let response = match download {
        Download::Single {
            file_name,
            content_type,
            contents,
        } => builder
            .header(header::CONTENT_TYPE, header_value(&content_type)?)
            .header(FILENAME_HEADER, header_value(&file_name)?)
            .body(Body::from(contents)),
        Download::Archive {
            file_name,
            contents,
        } => builder
            .header(header::CONTENT_TYPE, ZIP_CONTENT_TYPE)
            .header(
                header::CONTENT_DISPOSITION,
                header_value(&format!("attachment; filename={}", file_name))?,
            )
            .header(FILENAME_HEADER, header_value(&file_name)?)
            .body(Body::from(contents)),
    };

    response.map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_download_headers() {
        let response = download_response(Download::Single {
            file_name: "cat.png".to_string(),
            content_type: "image/png".to_string(),
            contents: b"PNG".to_vec(),
        })
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()["filename"], "cat.png");
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    }

    #[test]
    fn test_archive_download_headers() {
        let response = download_response(Download::Archive {
            file_name: "bundle.zip".to_string(),
            contents: vec![],
        })
        .unwrap();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-zip-compressed"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=bundle.zip"
        );
        assert_eq!(response.headers()["filename"], "bundle.zip");
    }

    #[test]
    fn test_non_ascii_file_name_is_sent() {
        let response = download_response(Download::Single {
            file_name: "café.png".to_string(),
            content_type: "image/png".to_string(),
            contents: vec![],
        })
        .unwrap();
        assert_eq!(response.headers()["filename"].as_bytes(), "café.png".as_bytes());
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let result = download_response(Download::Single {
            file_name: "bad\nname.png".to_string(),
            content_type: "image/png".to_string(),
            contents: vec![],
        });
        let (status, _) = result.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
