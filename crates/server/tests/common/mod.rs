//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock catalog injected, enabling E2E testing without a real
//! Xtream panel.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reelshelf_core::{load_config_from_str, testing::MockCatalog, CatalogSource, Config};
use reelshelf_server::state::AppState;

/// Re-export fixtures for test convenience
pub use reelshelf_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_categories() {
///     let fixture = TestFixture::new().await;
///     fixture.catalog.set_categories(vec![fixtures::category("1", "Drama")]).await;
///
///     let response = fixture.get("/api/v1/categories").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock catalog - configure categories, series and episode bodies
    pub catalog: Arc<MockCatalog>,
    /// Shared state, for direct access to the hub and cache
    pub state: Arc<AppState>,
    /// Temporary directory holding the snapshot and the downloads
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response, for non-JSON bodies.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_keep_alive_secs(15).await
    }

    /// Create a fixture whose progress streams send keep-alives after `secs` idle seconds.
    pub async fn with_keep_alive_secs(secs: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog = Arc::new(MockCatalog::new());

        let config = test_config(&temp_dir, secs);
        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&catalog) as Arc<dyn CatalogSource>,
        ));
        let router = reelshelf_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            catalog,
            state,
            temp_dir,
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.temp_dir.path().join("cached_series_data.json")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.temp_dir.path().join("downloads")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with a url-encoded form body.
    pub async fn post_form(&self, path: &str, body: &str) -> TestResponse {
        let raw = self
            .request_raw("POST", path, Some((body, "application/x-www-form-urlencoded")))
            .await;
        TestResponse {
            status: raw.status,
            body: serde_json::from_str(&raw.text).unwrap_or(Value::Null),
        }
    }

    /// Send a GET request and read the body as text (e.g. SSE, metrics).
    pub async fn get_text(&self, path: &str) -> RawResponse {
        self.request_raw("GET", path, None).await
    }

    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: Option<(&str, &str)>,
    ) -> RawResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some((content, content_type)) => {
                request_builder = request_builder.header("Content-Type", content_type);
                Body::from(content.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request_builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            content_type,
            text: String::from_utf8_lossy(&body_bytes).into_owned(),
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

fn test_config(temp_dir: &TempDir, keep_alive_secs: u64) -> Config {
    let toml = format!(
        r#"
[server]
host = "127.0.0.1"
port = 5000

[catalog]
base_url = "http://panel.invalid"
username = "user"
password = "secret"

[cache]
path = "{cache}"

[downloads]
dir = "{downloads}"

[progress]
keep_alive_secs = {keep_alive_secs}
"#,
        cache = temp_dir.path().join("cached_series_data.json").display(),
        downloads = temp_dir.path().join("downloads").display(),
    );

    load_config_from_str(&toml).expect("Failed to parse test config")
}

/// Split an SSE body into its `data:` payloads, parsed as JSON.
pub fn sse_data_frames(text: &str) -> Vec<Value> {
    text.split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("SSE data is JSON"))
        .collect()
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
