use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rimagen::{
    ApiClient, AvailabilityMonitor, FileSink, GenerationOrchestrator, GenerationRequest,
    ImageService, RequestLifecycle, ServiceConfig, ServiceReadiness,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0xAB, 0xCD];

type Captured = Arc<Mutex<Vec<Value>>>;

async fn spawn_service(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str) -> Arc<ApiClient> {
    let config = ServiceConfig::new()
        .with_base_url(base_url)
        .with_timeouts(Duration::from_secs(2), Duration::from_secs(5));
    Arc::new(ApiClient::new(&config).expect("client"))
}

fn healthy_routes<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route(
        "/health",
        get(|| async {
            Json(json!({
                "status": "healthy",
                "api_configured": true,
                "vertex_ai_accessible": true
            }))
        }),
    )
}

async fn capture_and_succeed(
    State(captured): State<Captured>,
    Json(body): Json<Value>,
) -> Json<Value> {
    captured.lock().await.push(body);
    Json(json!({
        "success": true,
        "image_data": STANDARD.encode(PNG_BYTES),
        "generation_time": 4.2
    }))
}

#[tokio::test]
async fn health_probe_reports_ready() {
    let base = spawn_service(healthy_routes()).await;
    let monitor = AvailabilityMonitor::initialize(client_for(&base)).await;
    assert_eq!(monitor.readiness(), ServiceReadiness::Ready);
}

#[tokio::test]
async fn health_probe_unconfigured_is_unavailable() {
    let app = Router::new().route(
        "/health",
        get(|| async { Json(json!({"status": "healthy", "api_configured": false})) }),
    );
    let base = spawn_service(app).await;
    let monitor = AvailabilityMonitor::initialize(client_for(&base)).await;
    assert_eq!(monitor.readiness(), ServiceReadiness::Unavailable);
}

#[tokio::test]
async fn health_probe_error_status_is_unavailable() {
    let app = Router::new().route(
        "/health",
        get(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "healthy", "api_configured": true})),
            )
        }),
    );
    let base = spawn_service(app).await;
    let monitor = AvailabilityMonitor::initialize(client_for(&base)).await;
    assert_eq!(monitor.readiness(), ServiceReadiness::Unavailable);
}

#[tokio::test]
async fn health_probe_malformed_body_is_unavailable() {
    let app = Router::new().route("/health", get(|| async { "ok" }));
    let base = spawn_service(app).await;
    let monitor = AvailabilityMonitor::initialize(client_for(&base)).await;
    assert_eq!(monitor.readiness(), ServiceReadiness::Unavailable);
}

#[tokio::test]
async fn unreachable_service_is_unavailable_and_fails_generation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = client_for(&base);
    let monitor = AvailabilityMonitor::initialize(client.clone()).await;
    assert_eq!(monitor.readiness(), ServiceReadiness::Unavailable);

    let dir = tempfile::tempdir().unwrap();
    let orchestrator = GenerationOrchestrator::new(client, Arc::new(FileSink::new(dir.path())));
    orchestrator
        .submit(GenerationRequest::new("a red fox in snow").unwrap())
        .await
        .unwrap();

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.lifecycle, RequestLifecycle::Failed);
    assert!(!snapshot.error_message().unwrap().is_empty());
    assert!(!orchestrator.is_in_flight());
}

#[tokio::test]
async fn generate_and_download_end_to_end() {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = healthy_routes()
        .route("/generate-image", post(capture_and_succeed))
        .with_state(captured.clone());
    let base = spawn_service(app).await;
    let client = client_for(&base);

    let monitor = AvailabilityMonitor::initialize(client.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = GenerationOrchestrator::new(client, Arc::new(FileSink::new(dir.path())));
    assert!(orchestrator.submit_enabled(monitor.is_ready()));

    orchestrator
        .submit(GenerationRequest::new("a red fox in snow").unwrap())
        .await
        .unwrap();

    let bodies = captured.lock().await.clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0],
        json!({
            "prompt": "a red fox in snow",
            "negative_prompt": null,
            "aspect_ratio": "1:1",
            "person_generation": "dont_allow"
        })
    );

    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.lifecycle, RequestLifecycle::Succeeded);
    let image = snapshot.image().unwrap();
    assert_eq!(image.bytes, PNG_BYTES);
    assert_eq!(image.elapsed_seconds, Some(4.2));

    let first = orchestrator.download_current_result().await.unwrap().unwrap();
    let second = orchestrator.download_current_result().await.unwrap().unwrap();
    assert_ne!(first.filename, second.filename);
    for saved in [first, second] {
        let path = saved.location.unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(path).unwrap(), PNG_BYTES);
    }
}

#[tokio::test]
async fn service_reported_failure_is_shown_verbatim() {
    let app = Router::new().route(
        "/generate-image",
        post(|| async { Json(json!({"success": false, "error": "quota exceeded"})) }),
    );
    let base = spawn_service(app).await;
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        GenerationOrchestrator::new(client_for(&base), Arc::new(FileSink::new(dir.path())));

    orchestrator
        .submit(GenerationRequest::new("cat").unwrap())
        .await
        .unwrap();
    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.lifecycle, RequestLifecycle::Failed);
    assert_eq!(snapshot.error_message(), Some("quota exceeded"));
    assert!(orchestrator.download_current_result().await.unwrap().is_none());
}

#[tokio::test]
async fn http_error_detail_becomes_failure_message() {
    let app = Router::new().route(
        "/generate-image",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "No image returned from Imagen API. Check prompt or safety settings."})),
            )
        }),
    );
    let base = spawn_service(app).await;
    let client = client_for(&base);

    let payload = GenerationRequest::new("cat").unwrap().to_payload();
    let err = client.generate(&payload).await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "No image returned from Imagen API. Check prompt or safety settings."
    );
}

#[tokio::test]
async fn validation_detail_list_is_joined() {
    let app = Router::new().route(
        "/generate-image",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"detail": [
                    {"loc": ["body", "aspect_ratio"], "msg": "Unsupported aspect ratio", "type": "value_error"}
                ]})),
            )
        }),
    );
    let base = spawn_service(app).await;
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        GenerationOrchestrator::new(client_for(&base), Arc::new(FileSink::new(dir.path())));

    orchestrator
        .submit(GenerationRequest::new("cat").unwrap())
        .await
        .unwrap();
    assert_eq!(
        orchestrator.snapshot().await.error_message(),
        Some("Unsupported aspect ratio")
    );
}

#[tokio::test]
async fn non_json_success_body_is_transport_failure() {
    let app = Router::new().route(
        "/generate-image",
        post(|| async { "<html>proxy page</html>" }),
    );
    let base = spawn_service(app).await;
    let dir = tempfile::tempdir().unwrap();
    let orchestrator =
        GenerationOrchestrator::new(client_for(&base), Arc::new(FileSink::new(dir.path())));

    orchestrator
        .submit(GenerationRequest::new("cat").unwrap())
        .await
        .unwrap();
    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.lifecycle, RequestLifecycle::Failed);
    assert!(snapshot
        .error_message()
        .unwrap()
        .starts_with("Invalid response from service"));
}

#[tokio::test]
async fn service_info_and_models() {
    let app = Router::new()
        .route(
            "/",
            get(|| async {
                Json(json!({"message": "Text-to-Image Generator API", "status": "running"}))
            }),
        )
        .route(
            "/models",
            get(|| async {
                Json(json!({"models": [{
                    "name": "imagen-3.0-generate-001",
                    "description": "Text-to-image model",
                    "supported_aspect_ratios": ["1:1", "9:16", "16:9", "4:3", "3:4"],
                    "max_prompt_length": 1000
                }]}))
            }),
        );
    let base = spawn_service(app).await;
    let client = client_for(&base);

    let info = client.service_info().await.unwrap();
    assert_eq!(info.status, "running");

    let catalog = client.models().await.unwrap();
    assert_eq!(catalog.models.len(), 1);
    assert_eq!(catalog.models[0].name, "imagen-3.0-generate-001");
    assert_eq!(catalog.models[0].max_prompt_length, Some(1000));
}
