use crate::client::endpoint::{Endpoint, DETECTION, HEALTH, MODELS};
use crate::client::execution::run_async;
use crate::client::policy::PolicyEngine;
use crate::client::request::DetectionRequest;
use crate::config::ClientConfig;
use crate::transport::{ApiRequest, AsyncTransport, HttpTransport};
use crate::types::{ContentPart, GuardrailResponse, Message, ModelList};
use crate::{Error, Result};
use arc_swap::ArcSwapOption;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// State shared by every handle of one client: the immutable config and the
/// connection resource. The resource is taken out exactly once, on close.
pub(crate) struct ClientCore<T> {
    pub config: ClientConfig,
    pub engine: PolicyEngine,
    transport: ArcSwapOption<T>,
}

impl<T> ClientCore<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let engine = PolicyEngine::new(config.max_retries, config.retry);
        Self {
            config,
            engine,
            transport: ArcSwapOption::from_pointee(transport),
        }
    }

    /// Borrow the connection resource for one call.
    ///
    /// In-flight calls keep their own handle, so closing never cuts a call
    /// short; the resource is dropped when the last call releases it.
    pub fn transport(&self) -> Result<Arc<T>> {
        self.transport.load_full().ok_or_else(Error::client_closed)
    }

    /// Returns `true` if this call closed the client.
    pub fn close(&self) -> bool {
        self.transport.swap(None).is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.transport.load().is_none()
    }

    pub fn request(&self, endpoint: Endpoint, body: Option<serde_json::Value>) -> ApiRequest {
        ApiRequest {
            method: endpoint.method,
            url: self.config.endpoint_url(endpoint.path),
            path: endpoint.path,
            body,
            client_request_id: Uuid::new_v4().to_string(),
        }
    }
}

type DynAsyncTransport = Box<dyn AsyncTransport>;

/// Non-blocking guardrail client.
///
/// Handles are cheap to clone and share one connection pool. Any number of
/// calls may be in flight at once; each keeps its own retry state.
///
/// ```rust,no_run
/// use xiangxinai::{AsyncGuardrailClient, ClientConfig};
///
/// # async fn run() -> xiangxinai::Result<()> {
/// let client = AsyncGuardrailClient::new(ClientConfig::new("your-api-key"))?;
/// let verdict = client
///     .scope(|c| async move { c.check_prompt("How do I bake bread?", None).await })
///     .await?;
/// println!("{} -> {}", verdict.overall_risk_level, verdict.suggest_action);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AsyncGuardrailClient {
    core: Arc<ClientCore<DynAsyncTransport>>,
}

impl std::fmt::Debug for AsyncGuardrailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncGuardrailClient")
            .field("config", &self.core.config)
            .field("closed", &self.core.is_closed())
            .finish()
    }
}

/// Closes the client when dropped, whichever way the scope ends.
struct CloseOnDrop(Arc<ClientCore<DynAsyncTransport>>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl AsyncGuardrailClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::from_parts(config, transport))
    }

    /// Shorthand for a client with default settings.
    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(api_key))
    }

    /// Build a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: impl AsyncTransport + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, transport))
    }

    fn from_parts(config: ClientConfig, transport: impl AsyncTransport + 'static) -> Self {
        let transport: DynAsyncTransport = Box::new(transport);
        Self {
            core: Arc::new(ClientCore::new(config, transport)),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.core.config
    }

    /// Run `f` with this client and close it afterwards.
    ///
    /// The client is closed when `f`'s future completes, panics, or is
    /// dropped before completion.
    pub async fn scope<F, Fut, T>(self, f: F) -> T
    where
        F: FnOnce(AsyncGuardrailClient) -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = CloseOnDrop(self.core.clone());
        f(self).await
    }

    /// Release the connection pool. Later calls fail with [`Error::ClientClosed`].
    ///
    /// Returns `false` if the client was already closed.
    pub fn close(&self) -> bool {
        self.core.close()
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    /// Check a single user prompt.
    pub async fn check_prompt(
        &self,
        content: &str,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::prompt(content, user_id)?;
        self.detect(transport, body).await
    }

    /// Check a whole conversation in context. The last turn must be from the user.
    pub async fn check_conversation(
        &self,
        messages: &[Message],
        model: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::conversation(messages, model, user_id)?;
        self.detect(transport, body).await
    }

    /// Check a model answer in the context of the prompt that produced it.
    pub async fn check_response_ctx(
        &self,
        prompt: &str,
        response: &str,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::response_ctx(prompt, response, user_id)?;
        self.detect(transport, body).await
    }

    /// Check a prompt together with one image. The prompt may be empty.
    pub async fn check_prompt_image(
        &self,
        prompt: &str,
        image: impl Into<ContentPart>,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        self.check_prompt_images_with_model(prompt, &[image.into()], None, user_id)
            .await
    }

    /// Check a prompt together with several images. The prompt may be empty.
    pub async fn check_prompt_images(
        &self,
        prompt: &str,
        images: &[ContentPart],
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        self.check_prompt_images_with_model(prompt, images, None, user_id)
            .await
    }

    pub async fn check_prompt_images_with_model(
        &self,
        prompt: &str,
        images: &[ContentPart],
        model: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<GuardrailResponse> {
        let transport = self.core.transport()?;
        let body = DetectionRequest::prompt_images(prompt, images, model, user_id)?;
        self.detect(transport, body).await
    }

    pub async fn health_check(&self) -> Result<serde_json::Value> {
        let transport = self.core.transport()?;
        let request = self.core.request(HEALTH, None);
        run_async(&**transport, &self.core.engine, &request).await
    }

    pub async fn get_models(&self) -> Result<ModelList> {
        let transport = self.core.transport()?;
        let request = self.core.request(MODELS, None);
        run_async(&**transport, &self.core.engine, &request).await
    }

    async fn detect(
        &self,
        transport: Arc<DynAsyncTransport>,
        body: DetectionRequest,
    ) -> Result<GuardrailResponse> {
        let request = self.core.request(DETECTION, Some(body.to_json()?));
        run_async(&**transport, &self.core.engine, &request).await
    }
}
