//! Common test utilities for end-to-end testing with a mock converter.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by a real SQLite store and a [`MockConverter`] in place of
//! `ffmpeg`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediaconv_core::config::{CorsConfig, DatabaseConfig, SessionConfig, UploadConfig};
use mediaconv_core::testing::MockConverter;
use mediaconv_core::{Config, ConversionService, ConverterConfig, SqliteStore};
use mediaconv_server::{api::create_router, state::AppState};

/// Boundary used for multipart bodies built by the fixture.
const BOUNDARY: &str = "mediaconv-test-boundary";

/// Test fixture for end-to-end testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.upload("new", &[("cat.jpg", b"jpeg")]).await;
///
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock converter - control conversion outcomes
    pub converter: Arc<MockConverter>,
    /// Store behind the service, for direct assertions
    pub store: Arc<SqliteStore>,
    /// Temporary directory for test database and scratch files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `detail` message of an error body.
    pub fn detail(&self) -> &str {
        self.body["detail"].as_str().unwrap_or_default()
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub session_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub cors_hostname: Option<String>,
    pub max_parallel_conversions: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 600,
            max_body_bytes: 16 * 1024 * 1024,
            cors_hostname: Some("localhost:3000".to_string()),
            max_parallel_conversions: 4,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            session: SessionConfig {
                timeout_secs: test_config.session_timeout_secs,
            },
            upload: UploadConfig {
                max_body_bytes: test_config.max_body_bytes,
            },
            cors: CorsConfig {
                hostname: test_config.cors_hostname.clone(),
            },
            converter: ConverterConfig::default()
                .with_temp_dir(temp_dir.path().join("scratch"))
                .with_max_parallel(test_config.max_parallel_conversions),
            ..Default::default()
        };

        let store = Arc::new(
            SqliteStore::new(&db_path, config.session.timeout())
                .expect("Failed to create store"),
        );
        let converter = Arc::new(MockConverter::new());

        let service = Arc::new(ConversionService::new(
            store.clone(),
            store.clone(),
            converter.clone(),
            &config.converter,
        ));

        let state = Arc::new(AppState::new(config, service));
        let router = create_router(state);

        Self {
            router,
            converter,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a PATCH request without a body.
    pub async fn patch(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("PATCH").uri(path).body(Body::empty()).unwrap())
            .await
    }

    /// Upload files as `files` parts of a multipart form.
    pub async fn upload(&self, session_id: &str, files: &[(&str, &[u8])]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/upload?session_id={}", session_id))
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(files)))
            .unwrap();
        self.send(request).await
    }

    /// Upload into a fresh session and return its id.
    pub async fn new_session_with(&self, files: &[(&str, &[u8])]) -> String {
        let response = self.upload("new", files).await;
        assert_eq!(response.status, StatusCode::OK, "upload failed: {:?}", response.body);
        response.body["session_id"]
            .as_str()
            .expect("session_id missing")
            .to_string()
    }

    /// Send an arbitrary request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Build a multipart/form-data body with one `files` part per file.
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, contents) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
