use crate::client::core::ClientCore;
use crate::client::endpoint::{HEALTH, MODELS, DETECTION};
use crate::client::execution::run_blocking;
use crate::client::request::DetectionRequest;
use crate::config::ClientConfig;
use crate::transport::{BlockingHttpTransport, BlockingTransport};
use crate::types::{ContentPart, GuardrailResponse, Message, ModelList};
use crate::Result;
use std::sync::Arc;

type DynBlockingTransport = Box<dyn BlockingTransport>;

/// Blocking guardrail client.
///
/// Every call blocks the calling thread until it succeeds or retries are
/// exhausted. Do not use it from inside an async runtime; use
/// [`super::AsyncGuardrailClient`] there.
///
/// ```rust,no_run
/// use xiangxinai::{ClientConfig, GuardrailClient, Message};
///
/// # fn run() -> xiangxinai::Result<()> {
/// let client = GuardrailClient::new(ClientConfig::new("your-api-key"))?;
/// let verdict = client.check_conversation(
///     &[Message::user("hi"), Message::assistant("hello"), Message::user("tell me more")],
///     None,
///     None,
/// )?;
/// if verdict.is_blocked() {
///     println!("blocked: {:?}", verdict.all_categories());
/// }
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GuardrailClient {
    core: Arc<ClientCore<DynBlockingTransport>>,
}

impl std::fmt::Debug for GuardrailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardrailClient")
            .field("config", &self.core.config)
            .field("closed", &self.core.is_closed())
            .finish()
    }
}

impl GuardrailClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = BlockingHttpTransport::new(&config)?;
        Ok(Self::from_parts(config, transport))
    }

    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(api_key))
    }

    /// Build a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: impl BlockingTransport + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, transport))
    }

    fn from_parts(config: ClientConfig, transport: impl BlockingTransport + 'static) -> Self {
        let transport: DynBlockingTransport = Box::new(transport);
        Self {
            core: Arc::new(ClientCore::new(config, transport)),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.core.config
    }

    /// Release the connection pool. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        self.core.close()
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    pub fn check_prompt(&self, content: &str, user_id: Option<&str>) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::prompt(content, user_id)?;
        self.detect(&transport, body)
    }

    pub fn check_conversation(
        &self,
        messages: &[Message],
        model: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::conversation(messages, model, user_id)?;
        self.detect(&transport, body)
    }

    pub fn check_response_ctx(
        &self,
        prompt: &str,
        response: &str,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::response_ctx(prompt, response, user_id)?;
        self.detect(&transport, body)
    }

    pub fn check_prompt_image(
        &self,
        prompt: &str,
        image: impl Into<ContentPart>,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        self.check_prompt_images_with_model(prompt, &[image.into()], None, user_id)
    }

    pub fn check_prompt_images(
        &self,
        prompt: &str,
        images: &[ContentPart],
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        self.check_prompt_images_with_model(prompt, images, None, user_id)
    }

    pub fn check_prompt_images_with_model(
        &self,
        prompt: &str,
        images: &[ContentPart],
        model: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::prompt_images(prompt, images, model, user_id)?;
        self.detect(&transport, body)
    }

    pub fn health_check(&self) -> Result<serde_json::Value> {
        let transport = self.core.transport()?;
        let request = self.core.request(HEALTH, None);
        run_blocking(&**transport, &self.core.engine, &request)
    }

    pub fn get_models(&self) -> Result<ModelList> {
        let transport = self.core.transport()?;
        let request = self.core.request(MODELS, None);
        run_blocking(&**transport, &self.core.engine, &request)
    }

    fn detect(
        &self,
        transport: &DynBlockingTransport,
        body: DetectionRequest,
    ) -> Result<GuardrailResponse> {
        let request = self.core.request(DETECTION, Some(body.to_json()?));
        run_blocking(&**transport, &self.core.engine, &request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_code::ErrorCode;
    use crate::transport::{ApiRequest, RawResponse};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<serde_json::Value>>);

    impl BlockingTransport for Arc<Recorder> {
        fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
            self.0
                .lock()
                .unwrap()
                .push(request.body.clone().unwrap_or_default());
            Ok(RawResponse::new(
                200,
                r#"{
                    "id": "guardrails-1",
                    "result": {
                        "compliance": {"risk_level": "no_risk", "categories": []},
                        "security": {"risk_level": "no_risk", "categories": []}
                    },
                    "overall_risk_level": "no_risk",
                    "suggest_action": "pass"
                }"#,
            ))
        }
    }

    fn client() -> (GuardrailClient, Arc<Recorder>) {
        let rec = Arc::new(Recorder::default());
        let c = GuardrailClient::with_transport(ClientConfig::new("k"), rec.clone()).unwrap();
        (c, rec)
    }

    #[test]
    fn test_check_prompt_sends_single_user_turn() {
        let (c, rec) = client();
        let resp = c.check_prompt("  hello  ", Some("u-1")).unwrap();
        assert!(resp.is_safe());

        let sent = rec.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["model"], "Xiangxin-Guardrails-Text");
        assert_eq!(sent[0]["messages"][0]["role"], "user");
        assert_eq!(sent[0]["messages"][0]["content"], "hello");
        assert_eq!(sent[0]["user"], "u-1");
    }

    #[test]
    fn test_response_ctx_sends_both_turns() {
        let (c, rec) = client();
        c.check_response_ctx("how do I cook rice?", "rinse, then boil", None)
            .unwrap();
        let sent = rec.0.lock().unwrap();
        let msgs = sent[0]["messages"].as_array().unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1]["role"], "assistant");
    }

    #[test]
    fn test_blank_prompt_never_reaches_transport() {
        let (c, rec) = client();
        let err = c.check_prompt("   ", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
        assert!(rec.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_closed_client_rejects_calls() {
        let (c, rec) = client();
        let other = c.clone();
        assert!(c.close());
        assert!(other.is_closed());
        let err = other.get_models().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ClientClosed);
        assert!(rec.0.lock().unwrap().is_empty());
    }
}
