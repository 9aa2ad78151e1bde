//! Integration tests for the API server
//!
//! These start the server with stub providers, send real multipart
//! requests, and verify both the HTTP contract and the transient-staging
//! guarantees (no staged file survives a request).

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use adlens_api_server::{start_server, ApiState};
use adlens_common::{AdCopy, AnalysisResult, MediaKind};
use adlens_orchestrator::Pipeline;
use adlens_providers::{AnalysisError, CopyError, CopyGenerator, MediaAnalyzer};
use adlens_staging::{MediaStager, StagingConfig};

/// Analyzer stub with a call counter and a scripted outcome
struct StubAnalyzer {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl MediaAnalyzer for StubAnalyzer {
    async fn analyze(
        &self,
        media: &Path,
        _mime_type: &str,
        kind: MediaKind,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // The staged file must exist while analysis runs
        assert!(media.exists(), "staged file missing during analysis");
        if self.fail {
            return Err(AnalysisError::ApiRequest("provider unreachable".to_string()));
        }
        Ok(match kind {
            MediaKind::Video => AnalysisResult::video(
                "A product demo".to_string(),
                Some("Hello world".to_string()),
                vec![
                    "intro".to_string(),
                    "demo".to_string(),
                    "outro".to_string(),
                ],
            ),
            MediaKind::Image => AnalysisResult::image(
                "A sneaker".to_string(),
                Some(vec!["Just run".to_string()]),
                Some(vec!["sneaker".to_string()]),
            ),
        })
    }
}

/// Copy generator stub
struct StubCopyGenerator {
    fail: bool,
}

#[async_trait]
impl CopyGenerator for StubCopyGenerator {
    async fn generate(
        &self,
        _description: &str,
        _transcript: Option<&str>,
        _scenes: &[String],
    ) -> Result<AdCopy, CopyError> {
        if self.fail {
            return Err(CopyError::ApiRequest("copy provider down".to_string()));
        }
        Ok(AdCopy {
            headline: "Meet the Demo".to_string(),
            description: "See it in action.".to_string(),
        })
    }
}

fn test_state(
    root: &Path,
    analyzer_fail: bool,
    copy_fail: bool,
) -> (ApiState, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let stager = MediaStager::new(StagingConfig {
        root: root.to_path_buf(),
        ensure_root: true,
    });
    let pipeline = Pipeline::new(
        stager,
        Arc::new(StubAnalyzer {
            calls: calls.clone(),
            fail: analyzer_fail,
        }),
        Arc::new(StubCopyGenerator { fail: copy_fail }),
    );
    (ApiState::new(pipeline), calls)
}

fn media_form(field: &str, file_name: &str, mime: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(b"fake media bytes".to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap();
    reqwest::multipart::Form::new().part(field.to_string(), part)
}

fn staged_entries(root: &Path) -> usize {
    std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path(), false, false);
    let server_handle = tokio::spawn(async move {
        start_server("127.0.0.1:18180", state)
            .await
            .expect("Failed to start server");
    });

    // Give server time to start
    sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();
    let response = client
        .get("http://127.0.0.1:18180/health")
        .send()
        .await
        .expect("Failed to send health check request");

    assert_eq!(response.status(), 200);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());

    server_handle.abort();
}

#[tokio::test]
async fn test_analyze_video_full_result() {
    let dir = tempfile::tempdir().unwrap();
    let (state, calls) = test_state(dir.path(), false, false);
    let server_handle = tokio::spawn(async move {
        start_server("127.0.0.1:18181", state)
            .await
            .expect("Failed to start server");
    });

    sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18181/api/v1/analyze")
        .multipart(media_form("video", "demo.mp4", "video/mp4"))
        .send()
        .await
        .expect("Failed to send analyze request");

    assert_eq!(response.status(), 200);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["kind"], "video");
    assert_eq!(json["description"], "A product demo");
    assert_eq!(json["transcript"], "Hello world");
    assert_eq!(json["scenes"].as_array().unwrap().len(), 3);
    assert_eq!(json["copyResult"]["headline"], "Meet the Demo");
    assert_eq!(json["copyResult"]["description"], "See it in action.");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // The staged copy of the upload is gone once the response is out
    assert_eq!(staged_entries(dir.path()), 0);

    server_handle.abort();
}

#[tokio::test]
async fn test_analyze_succeeds_without_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path(), false, true);
    let server_handle = tokio::spawn(async move {
        start_server("127.0.0.1:18182", state)
            .await
            .expect("Failed to start server");
    });

    sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18182/api/v1/analyze")
        .multipart(media_form("video", "demo.mp4", "video/mp4"))
        .send()
        .await
        .expect("Failed to send analyze request");

    // Copy generation failing must not fail the request
    assert_eq!(response.status(), 200);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["description"], "A product demo");
    assert_eq!(json["transcript"], "Hello world");
    assert!(json.get("copyResult").is_none());

    assert_eq!(staged_entries(dir.path()), 0);

    server_handle.abort();
}

#[tokio::test]
async fn test_analyze_rejects_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let (state, calls) = test_state(dir.path(), false, false);
    let server_handle = tokio::spawn(async move {
        start_server("127.0.0.1:18183", state)
            .await
            .expect("Failed to start server");
    });

    sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18183/api/v1/analyze")
        .multipart(media_form("video", "notes.txt", "text/plain"))
        .send()
        .await
        .expect("Failed to send analyze request");

    assert_eq!(response.status(), 400);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["error"], "File must be a video or image");

    // No provider call was made and nothing was staged
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(staged_entries(dir.path()), 0);

    server_handle.abort();
}

#[tokio::test]
async fn test_analysis_failure_returns_server_error_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path(), true, false);
    let server_handle = tokio::spawn(async move {
        start_server("127.0.0.1:18184", state)
            .await
            .expect("Failed to start server");
    });

    sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18184/api/v1/analyze")
        .multipart(media_form("video", "photo.png", "image/png"))
        .send()
        .await
        .expect("Failed to send analyze request");

    assert_eq!(response.status(), 500);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(json["error"].as_str().unwrap().contains("analysis failed"));

    // Even on the failure path the staged file was removed
    assert_eq!(staged_entries(dir.path()), 0);

    server_handle.abort();
}

#[tokio::test]
async fn test_analyze_missing_file_field() {
    let dir = tempfile::tempdir().unwrap();
    let (state, calls) = test_state(dir.path(), false, false);
    let server_handle = tokio::spawn(async move {
        start_server("127.0.0.1:18185", state)
            .await
            .expect("Failed to start server");
    });

    sleep(Duration::from_millis(300)).await;

    // A form with only plain text values carries no media file
    let form = reqwest::multipart::Form::new().text("note", "no file here");

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18185/api/v1/analyze")
        .multipart(form)
        .send()
        .await
        .expect("Failed to send analyze request");

    assert_eq!(response.status(), 400);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["error"], "No media file provided");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    server_handle.abort();
}

#[tokio::test]
async fn test_analyze_image_result_shape() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path(), false, false);
    let server_handle = tokio::spawn(async move {
        start_server("127.0.0.1:18186", state)
            .await
            .expect("Failed to start server");
    });

    sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18186/api/v1/analyze")
        .multipart(media_form("video", "shoe.png", "image/png"))
        .send()
        .await
        .expect("Failed to send analyze request");

    assert_eq!(response.status(), 200);

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["kind"], "image");
    assert_eq!(json["adCopy"][0], "Just run");
    assert_eq!(json["visualElements"][0], "sneaker");
    // Video-only fields never leak onto an image result
    assert!(json.get("transcript").is_none());
    assert!(json.get("scenes").is_none());

    server_handle.abort();
}
