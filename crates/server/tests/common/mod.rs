//! Common test utilities for E2E testing.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by real sign actors and an on-disk audit log, without binding a
//! socket.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use marquee_core::{
    create_audit_system, load_config, AuditFilter, AuditRecord, AuditStore, ConfigStore,
    IngestGateway, ShowRouter, SignFleet, SqliteAuditStore,
};
use marquee_server::api::RenderBroadcaster;
use marquee_server::state::AppState;

/// Upload password in [`DEFAULT_CONFIG`].
pub const PASSWORD: &str = "popcorn";

/// Two signs in two auditoriums and a small catalog.
///
/// `{db}` is replaced with the fixture's database path.
pub const DEFAULT_CONFIG: &str = r#"
[database]
path = "{db}"

[ingest]
password = "popcorn"

[scheduler]
tick_interval_ms = 50
idle_media = "house.png"

[[signs]]
id = "left"
auditorium = "1"

[[signs]]
id = "right"
auditorium = "2"

[[movies]]
pattern = "X MEN*"

[[movies.assets]]
media = "xmen-poster.jpg"
duration_secs = 10

[[movies.assets]]
media = "xmen-trailer.mp4"

[[movies]]
pattern = "Heat"
auditoriums = ["2"]

[[movies.assets]]
media = "heat.jpg"

[[movies]]
pattern = "Coming Soon"

[[movies.assets]]
media = "trailer-a.mp4"

[[movies.assets]]
media = "trailer-b.mp4"
"#;

/// Test fixture for E2E testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_upload() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.upload(Some(PASSWORD), "X MEN").await;
///
///     assert_eq!(response.status, StatusCode::ACCEPTED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Audit log the fixture writes to
    pub audit_store: Arc<SqliteAuditStore>,
    /// Config file read by reloads
    pub config_path: PathBuf,
    /// Temporary directory for the config file and test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with [`DEFAULT_CONFIG`].
    pub async fn new() -> Self {
        Self::with_config(DEFAULT_CONFIG).await
    }

    /// Create a test fixture from a config template (see [`DEFAULT_CONFIG`]).
    pub async fn with_config(template: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let config_path = temp_dir.path().join("config.toml");

        let contents = template.replace("{db}", &db_path.display().to_string());
        std::fs::write(&config_path, contents).expect("Failed to write config");

        let config = load_config(&config_path).expect("Failed to load config");
        let config_store = ConfigStore::load(config).expect("Invalid test config");

        let audit_store =
            Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));
        let (audit_handle, audit_writer) =
            create_audit_system(Arc::clone(&audit_store) as Arc<dyn AuditStore>, 100);
        tokio::spawn(audit_writer.run());

        let renderers = RenderBroadcaster::default();
        let fleet = Arc::new(SignFleet::start(
            config_store.clone(),
            Arc::new(renderers.clone()),
            Some(audit_handle.clone()),
        ));
        let gateway = IngestGateway::new(
            config_store.clone(),
            Arc::clone(&fleet) as Arc<dyn ShowRouter>,
            Some(audit_handle.clone()),
        );

        let state = Arc::new(AppState::new(
            config_path.clone(),
            config_store,
            fleet,
            gateway,
            audit_handle,
            Arc::clone(&audit_store) as Arc<dyn AuditStore>,
            renderers,
        ));

        let router = marquee_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            audit_store,
            config_path,
            temp_dir,
        }
    }

    /// Overwrite the config file (does not reload).
    pub fn write_config(&self, template: &str) {
        let db_path = self.temp_dir.path().join("test.db");
        let contents = template.replace("{db}", &db_path.display().to_string());
        std::fs::write(&self.config_path, contents).expect("Failed to write config");
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.request("POST", path, Some(bytes), &[("Content-Type", "application/json")])
            .await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None, &[]).await
    }

    /// Upload a show, optionally with the password header.
    pub async fn upload(&self, password: Option<&str>, body: &str) -> TestResponse {
        let headers: Vec<(&str, &str)> = password
            .map(|p| vec![("X-Upload-Password", p)])
            .unwrap_or_default();
        self.request(
            "POST",
            "/api/v1/ingest",
            Some(body.as_bytes().to_vec()),
            &headers,
        )
        .await
    }

    /// Wait until the audit writer has persisted an event of `event_type`.
    pub async fn wait_for_audit(&self, event_type: &str) -> Vec<AuditRecord> {
        let filter = AuditFilter::new().with_event_type(event_type);
        for _ in 0..100 {
            let records = self.audit_store.query(&filter).expect("audit query failed");
            if !records.is_empty() {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("No '{}' audit event was written", event_type);
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Vec<u8>>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = body.map(Body::from).unwrap_or_else(Body::empty);
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
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
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
