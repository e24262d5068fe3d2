//! Engine facade
//!
//! `StreamEngine` picks the adapter named by the model id prefix and runs
//! one request through it. Build one per process and share it; adapters are
//! created per call and hold only `Arc`s.
//!
//! ```rust,ignore
//! use unistream::prelude::*;
//!
//! let engine = StreamEngine::builder()
//!     .config(EngineConfig::from_env())
//!     .credentials(StaticCredentials::from_env())
//!     .build()?;
//!
//! let config = GenerationConfig::new("anthropic::claude-sonnet-4-5")?.with_show_thoughts(true);
//! let mut callbacks = CollectingCallbacks::new();
//! engine
//!     .stream_response(&[Message::user("Hello")], &config, &mut callbacks)
//!     .await;
//! ```

use std::sync::Arc;

use crate::capabilities::CapabilityTable;
use crate::config::EngineConfig;
use crate::credentials::{CredentialProvider, StaticCredentials};
use crate::error::LlmError;
use crate::formatting::AttachmentResolver;
use crate::providers::{create_adapter, AdapterShared, Backend, ProviderAdapter};
use crate::streaming::{
    CancelHandle, CollectingCallbacks, LifecycleState, NotifyChannel, RequestLifecycle,
    StreamCallbacks,
};
use crate::types::{GenerationConfig, Message};

/// Entry point for streaming requests across every backend.
#[derive(Clone)]
pub struct StreamEngine {
    shared: Arc<AdapterShared>,
    credentials: Arc<dyn CredentialProvider>,
    channel: Option<Arc<dyn NotifyChannel>>,
}

impl std::fmt::Debug for StreamEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEngine")
            .field("shared", &self.shared)
            .field("channel", &self.channel.is_some())
            .finish_non_exhaustive()
    }
}

impl StreamEngine {
    pub fn builder() -> StreamEngineBuilder {
        StreamEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// The adapter serving `backend`.
    pub fn adapter(&self, backend: Backend) -> Result<Arc<dyn ProviderAdapter>, LlmError> {
        create_adapter(backend, self.shared.clone(), self.channel.clone())
    }

    /// Run one request to a terminal state.
    pub async fn stream_response(
        &self,
        conversation: &[Message],
        config: &GenerationConfig,
        callbacks: &mut dyn StreamCallbacks,
    ) -> LifecycleState {
        match self.adapter_for(config) {
            Ok(adapter) => {
                adapter
                    .stream_response(conversation, config, self.credentials.as_ref(), callbacks)
                    .await
            }
            Err(error) => self.reject(config, error, callbacks),
        }
    }

    pub async fn stream_response_with_cancel(
        &self,
        conversation: &[Message],
        config: &GenerationConfig,
        callbacks: &mut dyn StreamCallbacks,
        cancel: &CancelHandle,
    ) -> LifecycleState {
        match self.adapter_for(config) {
            Ok(adapter) => {
                adapter
                    .stream_response_with_cancel(
                        conversation,
                        config,
                        self.credentials.as_ref(),
                        callbacks,
                        cancel,
                    )
                    .await
            }
            Err(error) => self.reject(config, error, callbacks),
        }
    }

    /// Run a request and keep everything it produced.
    pub async fn collect(
        &self,
        conversation: &[Message],
        config: &GenerationConfig,
    ) -> CollectingCallbacks {
        let mut callbacks = CollectingCallbacks::new();
        self.stream_response(conversation, config, &mut callbacks)
            .await;
        callbacks
    }

    fn adapter_for(&self, config: &GenerationConfig) -> Result<Arc<dyn ProviderAdapter>, LlmError> {
        let backend = Backend::parse(config.model.backend())?;
        self.adapter(backend)
    }

    // Failures before any adapter exists still resolve through a lifecycle,
    // so the caller sees exactly one `on_error`.
    fn reject(
        &self,
        config: &GenerationConfig,
        error: LlmError,
        callbacks: &mut dyn StreamCallbacks,
    ) -> LifecycleState {
        let mut lifecycle = RequestLifecycle::new(
            config.model.backend(),
            callbacks,
            self.shared.config.complete_on_exit_with_content,
        );
        lifecycle.fail(error);
        lifecycle.state()
    }
}

/// Builder for [`StreamEngine`]
#[derive(Default)]
pub struct StreamEngineBuilder {
    config: Option<EngineConfig>,
    http_client: Option<reqwest::Client>,
    resolver: Option<Arc<dyn AttachmentResolver>>,
    capabilities: Option<CapabilityTable>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    channel: Option<Arc<dyn NotifyChannel>>,
}

impl StreamEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a preconfigured HTTP client (proxies, custom TLS).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn AttachmentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn credentials(mut self, credentials: impl CredentialProvider + 'static) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    pub fn shared_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Notify channel for the claude-code backend.
    pub fn channel(mut self, channel: Arc<dyn NotifyChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn build(self) -> Result<StreamEngine, LlmError> {
        let config = self.config.unwrap_or_default();
        let mut shared = match self.http_client {
            Some(client) => AdapterShared::with_client(client, config),
            None => AdapterShared::new(config)?,
        };
        if let Some(resolver) = self.resolver {
            shared = shared.with_resolver(resolver);
        }
        if let Some(capabilities) = self.capabilities {
            shared = shared.with_capabilities(capabilities);
        }
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(StaticCredentials::from_env()));

        tracing::debug!(
            channel = self.channel.is_some(),
            timeout_secs = shared.config.timeout.as_secs(),
            "Stream engine ready"
        );
        Ok(StreamEngine {
            shared: Arc::new(shared),
            credentials,
            channel: self.channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::CollectedOutcome;

    fn engine() -> StreamEngine {
        StreamEngine::builder()
            .http_client(reqwest::Client::new())
            .credentials(StaticCredentials::new())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_backend_fails_once() {
        let engine = engine();
        let config = GenerationConfig::new("bedrock::titan").unwrap();
        let collected = engine.collect(&[Message::user("hi")], &config).await;
        assert_eq!(collected.terminal_calls, 1);
        assert!(matches!(
            collected.outcome,
            Some(CollectedOutcome::Errored(ref message)) if message.contains("bedrock")
        ));
    }

    #[tokio::test]
    async fn claude_code_without_channel_is_a_configuration_error() {
        let engine = engine();
        let config = GenerationConfig::new("claude-code::sonnet").unwrap();
        let mut callbacks = CollectingCallbacks::new();
        let state = engine
            .stream_response(&[Message::user("hi")], &config, &mut callbacks)
            .await;
        assert_eq!(state, LifecycleState::Errored);
        assert!(callbacks.chunks.is_empty());
    }

    #[tokio::test]
    async fn missing_credential_is_reported_before_any_request() {
        let engine = engine();
        let config = GenerationConfig::new("openai::gpt-4o").unwrap();
        let collected = engine.collect(&[Message::user("hi")], &config).await;
        assert!(matches!(
            collected.outcome,
            Some(CollectedOutcome::Errored(ref message)) if message.contains("OPENAI_API_KEY")
        ));
    }
}
