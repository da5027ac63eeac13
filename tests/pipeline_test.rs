//! End-to-end tests for the upscale pipeline
//!
//! A mock upscale service runs on an ephemeral port; the real `UpscaleClient`
//! talks to it over HTTP while the queue and storage live in memory.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};

use upscaler::message::ValidationError;
use upscaler::queue::{InMemoryQueue, SpoolQueue};
use upscaler::storage::StorageClient;
use upscaler::upscale::{HttpConfig, Session, UpscaleClient, UpscaleError};
use upscaler::worker::{ImageProcessor, Iteration, ProcessError, WorkerSettings};

const API_KEY: &str = "test_api_key";

#[derive(Debug, Clone)]
struct RecordedRequest {
    content_type: Option<String>,
    body: Value,
}

/// Shared state of the mock upscale service
#[derive(Clone)]
struct MockUpscaleService {
    reply_image: Arc<Mutex<String>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpscaleService {
    fn new(reply_image: &str) -> Self {
        Self {
            reply_image: Arc::new(Mutex::new(reply_image.to_string())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, headers: &HeaderMap, body: Value) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest { content_type, body });
    }
}

/// Handler for /upscale: echoes the configured image
async fn upscale_ok(
    State(service): State<MockUpscaleService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    service.record(&headers, body);
    let image = service.reply_image.lock().unwrap().clone();
    Json(json!({ "base64_image": image, "model": "mock-x4" }))
}

/// Handler for /reject
async fn upscale_reject(
    State(service): State<MockUpscaleService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, &'static str) {
    service.record(&headers, body);
    (StatusCode::BAD_REQUEST, "image too large")
}

/// Handler for /garbage
async fn upscale_garbage(
    State(service): State<MockUpscaleService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, &'static str) {
    service.record(&headers, body);
    (StatusCode::OK, "definitely not json")
}

async fn start_mock_server(service: MockUpscaleService) -> String {
    let app = Router::new()
        .route("/upscale", post(upscale_ok))
        .route("/reject", post(upscale_reject))
        .route("/garbage", post(upscale_garbage))
        .with_state(service);

    // Bind to random available port
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", bound_addr)
}

struct Pipeline {
    processor: ImageProcessor,
    queue: Arc<InMemoryQueue>,
    storage: Arc<StorageClient>,
    session: Session,
}

fn pipeline(upscale_url: &str, no_message_delay: Duration) -> Pipeline {
    let queue = Arc::new(InMemoryQueue::new());
    let storage = Arc::new(StorageClient::in_memory());
    let upscaler = Arc::new(UpscaleClient::new(upscale_url, API_KEY).unwrap());

    let settings = WorkerSettings {
        no_message_delay,
        http: HttpConfig::default(),
    };
    let session = Session::open(&settings.http).unwrap();
    let processor = ImageProcessor::new(queue.clone(), upscaler, storage.clone(), settings);

    Pipeline {
        processor,
        queue,
        storage,
        session,
    }
}

async fn stored_images(storage: &StorageClient) -> Vec<Bytes> {
    let mut images = Vec::new();
    for key in storage.list_images().await.unwrap() {
        images.push(storage.download(&key).await.unwrap());
    }
    images
}

#[tokio::test]
async fn test_valid_message_reaches_storage() {
    let service = MockUpscaleService::new("c3VjY2Vzcw==");
    let base_url = start_mock_server(service.clone()).await;
    let p = pipeline(&format!("{}/upscale", base_url), Duration::from_millis(50));

    p.queue
        .push(json!({"width": 1024, "height": 768, "image_data": "abc123"}))
        .await;

    let outcome = p.processor.poll_once(&p.session).await;
    assert!(matches!(outcome, Iteration::Published(_)), "got {:?}", outcome);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        requests[0].body,
        json!({
            "access_token": API_KEY,
            "new_width": 1024,
            "new_height": 768,
            "base64_image": "abc123"
        })
    );

    assert_eq!(stored_images(&p.storage).await, vec![Bytes::from_static(b"success")]);
}

#[tokio::test]
async fn test_dimensions_reach_service_as_sent() {
    let service = MockUpscaleService::new("c3VjY2Vzcw==");
    let base_url = start_mock_server(service.clone()).await;
    let p = pipeline(&format!("{}/upscale", base_url), Duration::from_millis(50));

    p.queue
        .push(json!({"width": 1024.0, "height": 9223372036854775808u64, "image_data": "abc123"}))
        .await;

    let outcome = p.processor.poll_once(&p.session).await;
    assert!(matches!(outcome, Iteration::Published(_)), "got {:?}", outcome);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body["new_width"].is_f64());
    assert_eq!(requests[0].body["new_width"].as_f64(), Some(1024.0));
    assert_eq!(requests[0].body["new_height"].as_u64(), Some(9_223_372_036_854_775_808));
}

#[tokio::test]
async fn test_binary_image_round_trip() {
    let raw: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let service = MockUpscaleService::new(&STANDARD.encode(&raw));
    let base_url = start_mock_server(service.clone()).await;
    let p = pipeline(&format!("{}/upscale", base_url), Duration::from_millis(50));

    p.queue
        .push(json!({"width": 64, "height": 64, "image_data": STANDARD.encode(b"tiny")}))
        .await;

    p.processor.poll_once(&p.session).await;

    assert_eq!(stored_images(&p.storage).await, vec![Bytes::from(raw)]);
}

#[tokio::test]
async fn test_invalid_message_never_calls_service() {
    let service = MockUpscaleService::new("c3VjY2Vzcw==");
    let base_url = start_mock_server(service.clone()).await;
    let p = pipeline(&format!("{}/upscale", base_url), Duration::from_millis(50));

    p.queue.push(json!({"width": 1024, "height": 768})).await;
    p.queue
        .push(json!({"width": "wide", "height": 768, "image_data": "abc123"}))
        .await;

    for _ in 0..2 {
        let outcome = p.processor.poll_once(&p.session).await;
        assert!(matches!(outcome, Iteration::Dropped(ProcessError::Validation(_))));
    }

    assert!(service.requests().is_empty());
    assert!(p.storage.list_images().await.unwrap().is_empty());
    assert_eq!(p.processor.metrics().snapshot().validation_failures, 2);
}

#[tokio::test]
async fn test_missing_image_data_is_reported() {
    let p = pipeline("http://127.0.0.1:9/upscale", Duration::from_millis(50));
    p.queue.push(json!({"width": 1024, "height": 768})).await;

    let outcome = p.processor.poll_once(&p.session).await;
    assert!(matches!(
        outcome,
        Iteration::Dropped(ProcessError::Validation(ValidationError::MissingField("image_data")))
    ));
}

#[tokio::test]
async fn test_http_error_is_preserved_and_dropped() {
    let service = MockUpscaleService::new("c3VjY2Vzcw==");
    let base_url = start_mock_server(service.clone()).await;
    let p = pipeline(&format!("{}/reject", base_url), Duration::from_millis(50));

    p.queue
        .push(json!({"width": 1024, "height": 768, "image_data": "abc123"}))
        .await;

    let outcome = p.processor.poll_once(&p.session).await;
    match outcome {
        Iteration::Dropped(ProcessError::Upscale(UpscaleError::Http { status, message })) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Bad Request");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }

    assert_eq!(service.requests().len(), 1);
    assert!(p.storage.list_images().await.unwrap().is_empty());

    // Message is gone; the next iteration finds an empty queue
    assert!(matches!(p.processor.poll_once(&p.session).await, Iteration::Idle));
}

#[tokio::test]
async fn test_non_json_response_is_malformed() {
    let service = MockUpscaleService::new("unused");
    let base_url = start_mock_server(service).await;
    let p = pipeline(&format!("{}/garbage", base_url), Duration::from_millis(50));

    p.queue
        .push(json!({"width": 1, "height": 1, "image_data": "aGk="}))
        .await;

    let outcome = p.processor.poll_once(&p.session).await;
    assert!(matches!(
        outcome,
        Iteration::Dropped(ProcessError::Upscale(UpscaleError::MalformedResponse(_)))
    ));
    assert!(p.storage.list_images().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let p = pipeline(&format!("http://{}/upscale", addr), Duration::from_millis(50));
    p.queue
        .push(json!({"width": 1, "height": 1, "image_data": "aGk="}))
        .await;

    let outcome = p.processor.poll_once(&p.session).await;
    assert!(matches!(
        outcome,
        Iteration::Dropped(ProcessError::Upscale(UpscaleError::Transport(_)))
    ));
}

#[tokio::test]
async fn test_spool_queue_feeds_pipeline() {
    let service = MockUpscaleService::new("c3VjY2Vzcw==");
    let base_url = start_mock_server(service.clone()).await;

    let spool = Arc::new(SpoolQueue::in_memory("inbox"));
    let storage = Arc::new(StorageClient::in_memory());
    let upscaler = Arc::new(UpscaleClient::new(&format!("{}/upscale", base_url), API_KEY).unwrap());
    let settings = WorkerSettings {
        no_message_delay: Duration::from_millis(20),
        ..Default::default()
    };
    let session = Session::open(&settings.http).unwrap();
    let processor = ImageProcessor::new(spool.clone(), upscaler, storage.clone(), settings);

    spool
        .enqueue(&json!({"width": 300, "height": 200, "image_data": "Zmlyc3Q="}))
        .await
        .unwrap();
    spool
        .enqueue(&json!({"width": 600, "height": 400, "image_data": "c2Vjb25k"}))
        .await
        .unwrap();

    processor.poll_once(&session).await;
    processor.poll_once(&session).await;

    let widths: Vec<i64> = service
        .requests()
        .iter()
        .map(|r| r.body["new_width"].as_i64().unwrap())
        .collect();
    assert_eq!(widths, vec![300, 600]);
    assert_eq!(storage.list_images().await.unwrap().len(), 2);
    assert_eq!(spool.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_run_loop_survives_failures() {
    let service = MockUpscaleService::new("c3VjY2Vzcw==");
    let base_url = start_mock_server(service.clone()).await;
    let Pipeline {
        processor,
        queue,
        storage,
        ..
    } = pipeline(&format!("{}/upscale", base_url), Duration::from_millis(20));
    let metrics = processor.metrics();

    queue.push(json!({"height": 1, "image_data": "aGk="})).await;
    queue.push(json!("not an object")).await;
    queue
        .push(json!({"width": 8, "height": 8, "image_data": "aGk="}))
        .await;

    let handle = tokio::spawn(async move { processor.run().await });

    timeout(Duration::from_secs(10), async {
        while storage.list_images().await.unwrap().is_empty() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("valid message was never published");

    // Pushed after the loop went idle
    queue
        .push(json!({"width": 16, "height": 16, "image_data": "aGk="}))
        .await;

    timeout(Duration::from_secs(10), async {
        while storage.list_images().await.unwrap().len() < 2 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("loop stopped polling");

    assert!(!handle.is_finished());
    handle.abort();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.validation_failures, 2);
    assert_eq!(snapshot.images_published, 2);
    assert_eq!(service.requests().len(), 2);
}
