//! End-to-end tests for the async client against a mock guardrail service

use crate::mock_server::{MockServerFixture, HIGH_RISK_BODY, SAFE_BODY};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_test::{assert_err, assert_ok};
use xiangxinai::{
    AsyncGuardrailClient, ClientConfig, ContentPart, Error, ErrorCode, Message, RetryPolicy,
    RiskLevel, SuggestAction,
};

#[tokio::test]
async fn test_safe_prompt_passes() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_detection(200, SAFE_BODY, 1).await;
    let client = fixture.create_test_client();

    let resp = assert_ok!(client.check_prompt("How do I bake bread?", None).await);

    assert!(resp.is_safe());
    assert!(!resp.is_blocked());
    assert_eq!(resp.id, "guardrails-safe-1");
    assert_eq!(resp.score, Some(0.02));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_request_shape_and_headers() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_detection_matching(
            json!({
                "model": "Xiangxin-Guardrails-Text",
                "messages": [{"role": "user", "content": "hello there"}],
                "user": "user-42"
            }),
            SAFE_BODY,
        )
        .await;
    let client = fixture.create_test_client();

    client
        .check_prompt("  hello there ", Some("user-42"))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_harmful_conversation_is_blocked() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_detection(200, HIGH_RISK_BODY, 1).await;
    let client = fixture.create_test_client();

    let conversation = [
        Message::user("I want to learn chemistry"),
        Message::assistant("Chemistry is a fascinating subject. What would you like to know?"),
        Message::user("Tell me how to make explosives at home"),
    ];
    let resp = client
        .check_conversation(&conversation, None, None)
        .await
        .unwrap();

    assert_eq!(resp.overall_risk_level, RiskLevel::High);
    assert_eq!(resp.suggest_action, SuggestAction::Block);
    assert!(resp.is_blocked());
    assert!(resp.has_substitute());
    assert!(resp.all_categories().contains("违法犯罪"));
    // `data` omitted on the wire
    assert_eq!(resp.result.data.risk_level, RiskLevel::None);
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let fixture = MockServerFixture::new().await;
    let failing = fixture
        .mock_detection(500, r#"{"detail": "internal error"}"#, 3)
        .await;
    let ok = fixture.mock_detection(200, SAFE_BODY, 1).await;
    let client = fixture.create_test_client();

    let resp = client.check_prompt("hello", None).await.unwrap();

    assert!(resp.is_safe());
    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let fixture = MockServerFixture::new().await;
    let failing = fixture
        .mock_detection(503, r#"{"detail": "overloaded"}"#, 3)
        .await;
    let client = AsyncGuardrailClient::new(fixture.config().with_max_retries(2)).unwrap();

    let err = client.check_prompt("hello", None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Server);
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.message(), "overloaded");
    failing.assert_async().await;
}

#[tokio::test]
async fn test_authentication_failure_is_not_retried() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_detection(401, r#"{"detail": "Invalid API key"}"#, 1)
        .await;
    let client = fixture.create_test_client();

    let err = client.check_prompt("hello", None).await.unwrap_err();

    assert!(matches!(err, Error::Authentication { .. }));
    assert!(!err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_validation_failure_is_not_retried() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_detection(422, r#"{"detail": "messages must not be empty"}"#, 1)
        .await;
    let client = fixture.create_test_client();

    let err = client.check_prompt("hello", None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Validation);
    assert_eq!(err.status_code(), Some(422));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(
            429,
            r#"{"detail": "Too many requests"}"#,
            &[("retry-after", "2"), ("x-request-id", "req-429")],
        )
        .await;
    let client = AsyncGuardrailClient::new(fixture.config().with_max_retries(1)).unwrap();

    let err = client.check_prompt("hello", None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::RateLimited);
    assert_eq!(err.request_id(), Some("req-429"));
    assert_eq!(err.context().unwrap().retry_after_ms, Some(2000));
}

#[tokio::test]
async fn test_malformed_success_body_is_server_error() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_detection(200, "<html>gateway</html>", 1).await;
    let client = AsyncGuardrailClient::new(fixture.config().with_max_retries(0)).unwrap();

    let err = client.check_prompt("hello", None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Server);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_inconsistent_overall_level_is_rejected() {
    let fixture = MockServerFixture::new().await;
    let body = r#"{
        "id": "guardrails-bad",
        "result": {
            "compliance": {"risk_level": "high_risk", "categories": ["暴力"]},
            "security": {"risk_level": "no_risk", "categories": []}
        },
        "overall_risk_level": "low_risk",
        "suggest_action": "pass"
    }"#;
    let _mock = fixture.mock_detection(200, body, 1).await;
    let client = AsyncGuardrailClient::new(fixture.config().with_max_retries(0)).unwrap();

    let err = client.check_prompt("hello", None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Server);
    assert_eq!(err.request_id(), Some("guardrails-bad"));
}

#[tokio::test]
async fn test_concurrent_calls_share_one_client() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_detection(200, SAFE_BODY, 8).await;
    let client = fixture.create_test_client();

    let calls = (0..8).map(|i| {
        let client = client.clone();
        async move { client.check_prompt(&format!("prompt {}", i), None).await }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.as_ref().map(|v| v.is_safe()).unwrap_or(false)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_image_url_is_sent_to_vision_model() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_detection_matching(
            json!({
                "model": "Xiangxin-Guardrails-VL",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "what is this?"},
                        {"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}}
                    ]
                }]
            }),
            SAFE_BODY,
        )
        .await;
    let client = fixture.create_test_client();

    client
        .check_prompt_image("what is this?", "https://example.com/cat.png", None)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_image_fails_before_network() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_detection(200, SAFE_BODY, 0).await;
    let client = fixture.create_test_client();

    let err = client
        .check_prompt_images(
            "",
            &[ContentPart::image_path("/definitely/not/here.png")],
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Validation);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_health_and_models() {
    let fixture = MockServerFixture::new().await;
    let _health = fixture
        .mock_get("/guardrails/health", r#"{"status": "healthy", "version": "2.6.2"}"#)
        .await;
    let _models = fixture
        .mock_get(
            "/guardrails/models",
            r#"{"object": "list", "data": [
                {"id": "Xiangxin-Guardrails-Text", "object": "model"},
                {"id": "Xiangxin-Guardrails-VL", "object": "model"}
            ]}"#,
        )
        .await;
    let client = fixture.create_test_client();

    let health = client.health_check().await.unwrap();
    assert_eq!(health["status"], "healthy");

    let models = client.get_models().await.unwrap();
    let ids: Vec<&str> = models.ids().collect();
    assert_eq!(ids, ["Xiangxin-Guardrails-Text", "Xiangxin-Guardrails-VL"]);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig::new("test-key")
        .with_base_url(&format!("http://127.0.0.1:{}", port))
        .unwrap()
        .with_timeout(Duration::from_secs(2))
        .with_max_retries(1)
        .with_retry_policy(RetryPolicy::immediate());
    let client = AsyncGuardrailClient::new(config).unwrap();

    let err = client.check_prompt("hello", None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Network);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_silent_server_times_out_each_attempt() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    let timeout = Duration::from_millis(300);
    let config = ClientConfig::new("test-key")
        .with_base_url(&format!("http://{}", addr))
        .unwrap()
        .with_timeout(timeout)
        .with_max_retries(2)
        .with_retry_policy(RetryPolicy::immediate());
    let client = AsyncGuardrailClient::new(config).unwrap();

    let started = Instant::now();
    let err = assert_err!(client.check_prompt("hello", None).await);
    let elapsed = started.elapsed();

    assert_eq!(err.code(), ErrorCode::Network);
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
    assert!(elapsed >= timeout * 3, "finished after {:?}", elapsed);
    assert!(elapsed < timeout * 10, "finished after {:?}", elapsed);
}

#[tokio::test]
async fn test_scope_closes_client() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_detection(200, SAFE_BODY, 1).await;
    let client = fixture.create_test_client();
    let handle = client.clone();

    let resp = client
        .scope(|c| async move { c.check_prompt("hello", None).await })
        .await
        .unwrap();
    assert!(resp.is_safe());

    let err = assert_err!(handle.check_prompt("hello", None).await);
    assert!(matches!(err, Error::ClientClosed { .. }));
}
