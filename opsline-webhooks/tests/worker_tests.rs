//! Delivery worker tests against mock tenant endpoints

use opsline_events::EventBuilder;
use opsline_webhooks::*;
use std::sync::Arc;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEST: &str = "https://api.opsline.test/webhooks/deliver";
const CURRENT_KEY: &str = "sig_current";
const NEXT_KEY: &str = "sig_next";

struct Harness {
    worker: DeliveryWorker,
    subscriptions: Arc<InMemorySubscriptionStore>,
    dead_letters: Arc<InMemoryDeadLetterSink>,
}

fn harness() -> Harness {
    let queue = QueueConfig::new()
        .with_destination(DEST)
        .with_signing_keys(CURRENT_KEY, Some(NEXT_KEY));
    harness_with(queue)
}

fn harness_with(queue: QueueConfig) -> Harness {
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let dead_letters = Arc::new(InMemoryDeadLetterSink::new());
    let worker = DeliveryWorker::new(&queue, WebhookConfig::default(), subscriptions.clone())
        .unwrap()
        .with_dead_letters(dead_letters.clone());
    Harness {
        worker,
        subscriptions,
        dead_letters,
    }
}

fn job_body(tenant: &str) -> Vec<u8> {
    let event = EventBuilder::new("order.status_changed", tenant, "o-1")
        .field("order_number", "A-1001")
        .field("from_status", "pending")
        .field("to_status", "confirmed")
        .build();
    QueuedDeliveryJob::for_event(event).to_bytes().unwrap()
}

fn signed_request(key: &str, body: Vec<u8>) -> WorkerRequest {
    let token = QueueSigner::new(key, "Upstash").sign(DEST, &body).unwrap();
    WorkerRequest::new(body).header("Upstash-Signature", token)
}

async fn tenant_endpoint(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_tampered_signature_makes_no_outbound_call() {
    let h = harness();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())));

    let body = job_body("t-1");
    let token = QueueSigner::new(CURRENT_KEY, "Upstash").sign(DEST, &body).unwrap();
    let tampered = format!("{}x", token);

    let response = h
        .worker
        .handle(&WorkerRequest::new(body.clone()).header("Upstash-Signature", tampered))
        .await;
    assert_eq!(response.status, 401);
    assert!(!response.is_retryable());

    let missing = h.worker.handle(&WorkerRequest::new(body)).await;
    assert_eq!(missing.status, 401);
}

#[tokio::test]
async fn test_body_swapped_under_valid_token_is_rejected() {
    let h = harness();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-2", format!("{}/hooks", server.uri())));

    let token = QueueSigner::new(CURRENT_KEY, "Upstash")
        .sign(DEST, &job_body("t-1"))
        .unwrap();
    let response = h
        .worker
        .handle(&WorkerRequest::new(job_body("t-2")).header("Upstash-Signature", token))
        .await;
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn test_next_key_is_accepted() {
    let h = harness();
    let server = tenant_endpoint(200).await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())));

    let response = h.worker.handle(&signed_request(NEXT_KEY, job_body("t-1"))).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["status"], "delivered");
}

#[tokio::test]
async fn test_no_url_is_success_shaped_noop() {
    let h = harness();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Tenant without a subscription at all
    let response = h.worker.handle(&signed_request(CURRENT_KEY, job_body("t-1"))).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["status"], "skipped");

    // Tenant that removed its URL after the job was enqueued
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())));
    h.subscriptions.clear_url("t-1");
    let response = h.worker.handle(&signed_request(CURRENT_KEY, job_body("t-1"))).await;
    assert_eq!(response.status, 200);
    assert!(!response.is_retryable());
}

#[tokio::test]
async fn test_signature_matches_body_and_secret() {
    let h = harness();
    let server = tenant_endpoint(200).await;
    h.subscriptions.upsert(
        WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())).with_secret("whsec_t1"),
    );

    let response = h.worker.handle(&signed_request(CURRENT_KEY, job_body("t-1"))).await;
    assert_eq!(response.status, 200);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let request = &received[0];

    let signature = request.headers.get("X-Webhook-Signature").unwrap().to_str().unwrap();
    assert!(WebhookSignature::new("whsec_t1").verify(&request.body, signature));
    assert_eq!(
        request.headers.get("X-Webhook-Event").unwrap().to_str().unwrap(),
        "order.status_changed"
    );
    assert!(request.headers.get("X-Webhook-Timestamp").is_some());

    let event: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(event["payload"]["to_status"], "confirmed");
    assert_eq!(
        request.headers.get("X-Webhook-Id").unwrap().to_str().unwrap(),
        event["event_id"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_unsigned_without_secret() {
    let h = harness();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("X-Webhook-Event"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", server.uri()));

    let response = h.worker.handle(&signed_request(CURRENT_KEY, job_body("t-1"))).await;
    assert_eq!(response.status, 200);

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("X-Webhook-Signature").is_none());
}

#[tokio::test]
async fn test_redelivery_calls_destination_twice() {
    let h = harness();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    h.subscriptions
        .upsert(
            WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())).with_secret("s"),
        );

    let body = job_body("t-1");
    let first = h.worker.handle(&signed_request(CURRENT_KEY, body.clone())).await;
    let second = h.worker.handle(&signed_request(CURRENT_KEY, body)).await;

    assert_eq!(first.status, 200);
    assert_eq!(second.status, 200);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].body, received[1].body);
}

#[tokio::test]
async fn test_secret_rotation_between_attempts() {
    let h = harness();
    let server = tenant_endpoint(200).await;
    h.subscriptions.upsert(
        WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())).with_secret("old"),
    );

    let body = job_body("t-1");
    h.worker.handle(&signed_request(CURRENT_KEY, body.clone())).await;
    h.subscriptions.rotate_secret("t-1", "new");
    h.worker.handle(&signed_request(CURRENT_KEY, body)).await;

    let received = server.received_requests().await.unwrap();
    let second = &received[1];
    let signature = second.headers.get("X-Webhook-Signature").unwrap().to_str().unwrap();
    assert!(WebhookSignature::new("new").verify(&second.body, signature));
    assert!(!WebhookSignature::new("old").verify(&second.body, signature));
}

#[tokio::test]
async fn test_destination_failure_asks_for_retry() {
    let h = harness();
    let server = tenant_endpoint(502).await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())));

    let request = signed_request(CURRENT_KEY, job_body("t-1")).header("Upstash-Retried", "1");
    let response = h.worker.handle(&request).await;

    assert_eq!(response.status, 500);
    assert!(response.is_retryable());
    assert!(h.dead_letters.is_empty());
}

#[tokio::test]
async fn test_last_attempt_is_dead_lettered() {
    let h = harness();
    let server = tenant_endpoint(503).await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())));

    let request = signed_request(CURRENT_KEY, job_body("t-1")).header("Upstash-Retried", "3");
    let response = h.worker.handle(&request).await;

    assert_eq!(response.status, 500);
    let letters = h.dead_letters.letters();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].tenant_id, "t-1");
    assert_eq!(letters[0].attempts, 4);
    assert!(letters[0].reason.contains("503"));
}

#[tokio::test]
async fn test_unreachable_destination_is_retryable() {
    let h = harness();
    // Nothing listens on port 9 locally
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", "http://127.0.0.1:9/hooks"));

    let response = h.worker.handle(&signed_request(CURRENT_KEY, job_body("t-1"))).await;
    assert_eq!(response.status, 500);
    assert!(response.is_retryable());
}

#[tokio::test]
async fn test_malformed_job_is_terminal() {
    let h = harness();
    let response = h
        .worker
        .handle(&signed_request(CURRENT_KEY, b"{\"tenant_id\": 5}".to_vec()))
        .await;
    assert_eq!(response.status, 400);
    assert!(!response.is_retryable());
}

#[tokio::test]
async fn test_auth_skipped_without_keys() {
    let h = harness_with(QueueConfig::new().with_destination(DEST));
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-Webhook-Event", "order.status_changed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", server.uri()));

    let response = h.worker.handle(&WorkerRequest::new(job_body("t-1"))).await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_token_for_another_destination_makes_no_outbound_call() {
    let h = harness();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    h.subscriptions
        .upsert(WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())));

    let body = job_body("t-1");
    let token = QueueSigner::new(CURRENT_KEY, "Upstash")
        .sign("https://other-service.example/ingest", &body)
        .unwrap();
    let response = h
        .worker
        .handle(&WorkerRequest::new(body).header("Upstash-Signature", token))
        .await;

    assert_eq!(response.status, 401);
    assert!(!response.is_retryable());
}

struct UnavailableSubscriptions;

#[async_trait::async_trait]
impl SubscriptionStore for UnavailableSubscriptions {
    async fn subscription(&self, _tenant_id: &str) -> Result<Option<WebhookSubscription>> {
        Err(WebhookError::SubscriptionStore("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_subscription_store_outage_is_retryable() {
    let queue = QueueConfig::new()
        .with_destination(DEST)
        .with_signing_keys(CURRENT_KEY, None::<String>);
    let worker = DeliveryWorker::new(
        &queue,
        WebhookConfig::default(),
        Arc::new(UnavailableSubscriptions),
    )
    .unwrap();

    let response = worker.handle(&signed_request(CURRENT_KEY, job_body("t-1"))).await;
    assert_eq!(response.status, 500);
    assert!(response.is_retryable());
}

struct BrokenSink;

#[async_trait::async_trait]
impl DeadLetterSink for BrokenSink {
    async fn record(&self, _letter: DeadLetter) -> Result<()> {
        Err(WebhookError::DeadLetterSink("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_dead_letter_sink_failure_keeps_response() {
    let queue = QueueConfig::new()
        .with_destination(DEST)
        .with_signing_keys(CURRENT_KEY, None::<String>);
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let worker = DeliveryWorker::new(&queue, WebhookConfig::default(), subscriptions.clone())
        .unwrap()
        .with_dead_letters(Arc::new(BrokenSink));

    let server = tenant_endpoint(503).await;
    subscriptions.upsert(WebhookSubscription::new("t-1", format!("{}/hooks", server.uri())));

    let request = signed_request(CURRENT_KEY, job_body("t-1")).header("Upstash-Retried", "3");
    let response = worker.handle(&request).await;
    assert_eq!(response.status, 500);
    assert!(response.is_retryable());
}
