//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zclip_api::{create_router, ApiConfig, AppState};
use zclip_worker::{JobExecutor, WorkerConfig};

const API_KEY: &str = "key123";

struct TestApp {
    router: Router,
    executor: Arc<JobExecutor>,
    dir: TempDir,
}

impl TestApp {
    fn movies_dir(&self) -> PathBuf {
        self.dir.path().join("movies")
    }
}

/// Script that answers like ffprobe for a 1920x1080 image.
#[cfg(unix)]
fn fake_ffprobe(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-ffprobe");
    std::fs::write(
        &script,
        "#!/bin/sh\necho '{\"streams\":[{\"width\":1920,\"height\":1080}]}'\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn test_app() -> TestApp {
    test_app_with(|_| {})
}

fn test_app_with(configure: impl FnOnce(&mut ApiConfig)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let movies = dir.path().join("movies");
    std::fs::create_dir_all(movies.join(API_KEY)).unwrap();

    #[cfg(unix)]
    let ffprobe_bin = fake_ffprobe(dir.path()).to_string_lossy().to_string();
    #[cfg(not(unix))]
    let ffprobe_bin = "ffprobe".to_string();

    let mut config = ApiConfig {
        cache_dir: dir.path().join("cache"),
        movies_dir: movies,
        ffprobe_bin,
        ..ApiConfig::default()
    };
    configure(&mut config);
    let mut worker_config = WorkerConfig {
        ffmpeg_bin: "true".to_string(),
        ..WorkerConfig::default()
    };
    worker_config.artifact.scheme = "http".to_string();

    let state = AppState::new(config, worker_config).unwrap();
    let executor = Arc::clone(&state.executor);

    TestApp {
        router: create_router(state, None),
        executor,
        dir,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn create_video_request(api_key: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/create-video")
        .header("host", "render.local:8000")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn render_body(source_base: &str) -> Value {
    json!({
        "record_id": "rec42",
        "input_url": format!("{}/photo.jpg", source_base),
        "webhook_url": format!("{}/hook", source_base),
        "framerate": 25,
        "duration": 5,
        "zoom": "",
        "crop": "true",
        "output_width": 720,
        "output_height": 1024
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pool"]["queued"], 0);
    assert_eq!(body["pool"]["capacity"], app.executor.capacity());
}

#[tokio::test]
async fn test_missing_api_key() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::builder().uri("/api/validate").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Missing x-api-key header");
}

#[tokio::test]
async fn test_malformed_api_key() {
    let app = test_app();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/validate")
                .header("x-api-key", "../etc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Invalid API key");
}

#[tokio::test]
async fn test_api_key_without_directory() {
    let app = test_app();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/validate")
                .header("x-api-key", "unknownkey")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Directory does not exist for the provided API key"
    );
}

#[tokio::test]
async fn test_validate_key_ok() {
    let app = test_app();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/validate")
                .header("x-api-key", API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "API key is valid");
}

#[tokio::test]
async fn test_create_video_requires_api_key() {
    let app = test_app();
    let response = app
        .router
        .oneshot(create_video_request(None, &render_body("http://127.0.0.1:9")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_error_names_field() {
    let app = test_app();
    let mut body = render_body("http://127.0.0.1:9");
    body["duration"] = json!(61);

    let response = app
        .router
        .oneshot(create_video_request(Some(API_KEY), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "duration");
    assert_eq!(app.executor.pending_jobs(), 0);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/create-video")
        .header("x-api-key", API_KEY)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_source_fetch_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = test_app();
    let response = app
        .router
        .oneshot(create_video_request(Some(API_KEY), &render_body(&server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(app.executor.pending_jobs(), 0);
}

async fn internal_error_detail(environment: &str) -> String {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;

    let app = test_app_with(|config| {
        config.environment = environment.to_string();
        config.ffprobe_bin = "zclip-missing-ffprobe".to_string();
    });
    let response = app
        .router
        .oneshot(create_video_request(Some(API_KEY), &render_body(&server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    body_json(response).await["detail"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_internal_error_hidden_in_production() {
    assert_eq!(
        internal_error_detail("production").await,
        "An internal error occurred"
    );
}

#[tokio::test]
async fn test_internal_error_detailed_outside_production() {
    assert!(internal_error_detail("development")
        .await
        .contains("zclip-missing-ffprobe"));
}

#[tokio::test]
async fn test_ftp_webhook_rejected_before_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = test_app();
    let mut body = render_body(&server.uri());
    body["webhook_url"] = json!("ftp://hooks.example.com/done");

    let response = app
        .router
        .oneshot(create_video_request(Some(API_KEY), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "webhook_url");
}

#[cfg(unix)]
#[tokio::test]
async fn test_create_video_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(create_video_request(Some(API_KEY), &render_body(&server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["record_id"], "rec42");
    assert_eq!(ack["message"], "Video processing started");
    assert_eq!(ack["input_width"], 1920);
    assert_eq!(ack["input_height"], 1080);
    assert_eq!(ack["output_width"], 720);
    assert_eq!(ack["output_height"], 1024);
    let filename = ack["filename"].as_str().unwrap().to_string();
    assert!(filename.ends_with(".mp4"));

    assert!(app.executor.shutdown(Duration::from_secs(5)).await);

    let requests = server.received_requests().await.unwrap();
    let hook = requests
        .iter()
        .find(|r| r.url.path() == "/hook")
        .expect("webhook was called");
    let payload: Value = serde_json::from_slice(&hook.body).unwrap();
    assert_eq!(payload["record_id"], "rec42");
    assert_eq!(
        payload["filename"],
        format!("http://render.local:8000/movies/{}/{}", API_KEY, filename)
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_cached_source_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = test_app();
    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(create_video_request(Some(API_KEY), &render_body(&server.uri())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert!(app.executor.shutdown(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_artifacts_are_served() {
    let app = test_app();
    std::fs::write(app.movies_dir().join(API_KEY).join("clip.mp4"), b"fake").unwrap();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri(format!("/movies/{}/clip.mp4", API_KEY))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
