//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use tokio::sync::Mutex;
use xiangxinai::{AsyncGuardrailClient, ClientConfig, RetryPolicy};

pub const API_KEY: &str = "test-key";
pub const DETECTION_PATH: &str = "/guardrails";

pub const SAFE_BODY: &str = r#"{
    "id": "guardrails-safe-1",
    "result": {
        "compliance": {"risk_level": "no_risk", "categories": []},
        "security": {"risk_level": "no_risk", "categories": []},
        "data": {"risk_level": "no_risk", "categories": []}
    },
    "overall_risk_level": "no_risk",
    "suggest_action": "pass",
    "suggest_answer": null,
    "score": 0.02
}"#;

pub const HIGH_RISK_BODY: &str = r#"{
    "id": "guardrails-high-1",
    "result": {
        "compliance": {"risk_level": "high_risk", "categories": ["违法犯罪"]},
        "security": {"risk_level": "no_risk", "categories": []}
    },
    "overall_risk_level": "high_risk",
    "suggest_action": "reject",
    "suggest_answer": "很抱歉，我不能提供涉及违法犯罪的信息。"
}"#;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(API_KEY)
            .with_base_url(&self.base_url)
            .expect("mock server url is valid")
            .with_retry_policy(RetryPolicy::immediate())
    }

    /// Create a test client pointed at the mock server, with no backoff waits.
    pub fn create_test_client(&self) -> AsyncGuardrailClient {
        AsyncGuardrailClient::new(self.config()).expect("client builds")
    }

    /// Detection mock answering `hits` times with `status` and `body`.
    pub async fn mock_detection(&self, status: usize, body: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", DETECTION_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Detection mock that only answers requests whose body contains `partial`.
    pub async fn mock_detection_matching(&self, partial: serde_json::Value, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", DETECTION_PATH)
            .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
            .match_header("content-type", "application/json")
            .match_header(
                "x-client-request-id",
                Matcher::Regex("^[0-9a-f-]{36}$".to_string()),
            )
            .match_body(Matcher::PartialJson(partial))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Create a mock for an error response
    pub async fn mock_error_response(
        &self,
        status: usize,
        error_body: &str,
        headers: &[(&str, &str)],
    ) -> Mock {
        let mut server = self.server.lock().await;
        let mut mock = server
            .mock("POST", DETECTION_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body);
        for (name, value) in headers {
            mock = mock.with_header(*name, value);
        }
        mock.create_async().await
    }

    pub async fn mock_get(&self, path: &str, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
