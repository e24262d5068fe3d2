//! Provider adapters
//!
//! One adapter per backend family. An adapter builds the vendor request,
//! performs the streaming handshake and supplies a fresh wire decoder.
//! Classification, tool call assembly and lifecycle handling are shared and
//! live in `crate::streaming`.
//!
//! ```rust,ignore
//! let shared = Arc::new(AdapterShared::new(EngineConfig::default())?);
//! let adapter = create_adapter(Backend::Anthropic, shared, None)?;
//! let state = adapter
//!     .stream_response(&conversation, &config, &credentials, &mut callbacks)
//!     .await;
//! ```

pub mod anthropic;
pub mod claude_code;
pub mod gemini;
mod http;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::capabilities::{CapabilityTable, ModelCapabilities};
use crate::config::{defaults, EngineConfig};
use crate::credentials::CredentialProvider;
use crate::error::LlmError;
use crate::formatting::{
    format_conversation, AttachmentResolver, FormattedMessage, MediaSupport,
    MemoryAttachmentResolver,
};
use crate::streaming::{
    wait_cancelled, CancelHandle, LifecycleState, NotifyChannel, RawEventStream, ReasoningMode,
    RequestLifecycle, StreamCallbacks, StreamSession, WireDecoder,
};
use crate::types::{validate_conversation, GenerationConfig, Message};

pub use anthropic::AnthropicAdapter;
pub use claude_code::ClaudeCodeAdapter;
pub use gemini::GeminiAdapter;
pub use ollama::OllamaAdapter;
pub use openai::{OpenAiAdapter, OpenAiFlavor};

/// Backend named by the prefix of a model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenAi,
    OpenRouter,
    Grok,
    LmStudio,
    Anthropic,
    Google,
    Ollama,
    #[serde(rename = "claude-code")]
    ClaudeCode,
}

impl Backend {
    pub const ALL: [Backend; 8] = [
        Backend::OpenAi,
        Backend::OpenRouter,
        Backend::Grok,
        Backend::LmStudio,
        Backend::Anthropic,
        Backend::Google,
        Backend::Ollama,
        Backend::ClaudeCode,
    ];

    pub fn parse(id: &str) -> Result<Self, LlmError> {
        let id = id.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|backend| backend.as_str().eq_ignore_ascii_case(id))
            .ok_or_else(|| LlmError::ConfigurationError(format!("Unknown backend `{id}`")))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Grok => "grok",
            Self::LmStudio => "lmstudio",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Ollama => "ollama",
            Self::ClaudeCode => "claude-code",
        }
    }

    /// Whether the backend is reached over HTTP (and so has a base URL).
    pub fn is_http(&self) -> bool {
        !matches!(self, Self::ClaudeCode)
    }

    /// Name of the credential the backend needs, if any.
    pub fn required_credential(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::Grok => Some("XAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::LmStudio | Self::Ollama | Self::ClaudeCode => None,
        }
    }

    pub fn media_support(&self) -> MediaSupport {
        match self {
            Self::Anthropic | Self::Google => MediaSupport::IMAGES_AND_PDFS,
            Self::ClaudeCode => MediaSupport::NONE,
            _ => MediaSupport::IMAGES,
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::OpenRouter => Some("https://openrouter.ai/api/v1"),
            Self::Grok => Some("https://api.x.ai/v1"),
            Self::LmStudio => Some("http://localhost:1234/v1"),
            Self::Anthropic => Some("https://api.anthropic.com/v1"),
            Self::Google => Some("https://generativelanguage.googleapis.com/v1beta"),
            Self::Ollama => Some("http://localhost:11434"),
            Self::ClaudeCode => None,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Per-attempt switches for `ProviderAdapter::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Include the backend's reasoning request parameter. Cleared on the
    /// retry that follows a `ParameterRejection`.
    pub reasoning_params: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            reasoning_params: true,
        }
    }
}

/// Everything an adapter needs to build one vendor request.
#[derive(Debug)]
pub struct AdapterRequest {
    /// Request-scoped id, used as the notify channel key
    pub request_id: String,
    pub config: GenerationConfig,
    pub messages: Vec<FormattedMessage>,
    pub api_key: Option<SecretString>,
    pub capabilities: ModelCapabilities,
    /// Resolved endpoint root; empty for non-HTTP backends
    pub base_url: String,
}

impl AdapterRequest {
    /// Model name without the backend prefix.
    pub fn model(&self) -> &str {
        self.config.model.model()
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn show_thoughts(&self) -> bool {
        self.config.show_thoughts
    }
}

/// State shared by every adapter an engine creates.
pub struct AdapterShared {
    pub http: reqwest::Client,
    pub config: EngineConfig,
    pub resolver: Arc<dyn AttachmentResolver>,
    pub capabilities: CapabilityTable,
}

impl AdapterShared {
    pub fn new(config: EngineConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(defaults::USER_AGENT)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: EngineConfig) -> Self {
        Self {
            http,
            config,
            resolver: Arc::new(MemoryAttachmentResolver::new()),
            capabilities: CapabilityTable::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn AttachmentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl std::fmt::Debug for AdapterShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterShared")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A backend family.
///
/// Implementors supply the handshake (`open`) and a decoder; the provided
/// `stream_response` methods run the shared request flow on top of them.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn backend(&self) -> Backend;

    fn shared(&self) -> &AdapterShared;

    fn required_credential(&self) -> Option<&'static str> {
        self.backend().required_credential()
    }

    /// Build the vendor payload, perform the handshake and return the raw
    /// event source.
    async fn open(
        &self,
        request: &AdapterRequest,
        options: RequestOptions,
    ) -> Result<RawEventStream, LlmError>;

    /// A fresh decoder for one request.
    fn decoder(&self, request: &AdapterRequest) -> Box<dyn WireDecoder>;

    /// Run one request to a terminal state. Exactly one of `on_complete` or
    /// `on_error` fires.
    async fn stream_response(
        &self,
        conversation: &[Message],
        config: &GenerationConfig,
        credentials: &dyn CredentialProvider,
        callbacks: &mut dyn StreamCallbacks,
    ) -> LifecycleState {
        run_request(self, conversation, config, credentials, callbacks, None).await
    }

    /// Like `stream_response`, released early when `cancel` fires.
    async fn stream_response_with_cancel(
        &self,
        conversation: &[Message],
        config: &GenerationConfig,
        credentials: &dyn CredentialProvider,
        callbacks: &mut dyn StreamCallbacks,
        cancel: &CancelHandle,
    ) -> LifecycleState {
        run_request(self, conversation, config, credentials, callbacks, Some(cancel)).await
    }
}

/// Construct the adapter for `backend`. The claude-code backend needs a
/// notify channel.
pub fn create_adapter(
    backend: Backend,
    shared: Arc<AdapterShared>,
    channel: Option<Arc<dyn NotifyChannel>>,
) -> Result<Arc<dyn ProviderAdapter>, LlmError> {
    let adapter: Arc<dyn ProviderAdapter> = match backend {
        Backend::OpenAi => Arc::new(OpenAiAdapter::new(OpenAiFlavor::OpenAi, shared)),
        Backend::OpenRouter => Arc::new(OpenAiAdapter::new(OpenAiFlavor::OpenRouter, shared)),
        Backend::Grok => Arc::new(OpenAiAdapter::new(OpenAiFlavor::Grok, shared)),
        Backend::LmStudio => Arc::new(OpenAiAdapter::new(OpenAiFlavor::LmStudio, shared)),
        Backend::Anthropic => Arc::new(AnthropicAdapter::new(shared)),
        Backend::Google => Arc::new(GeminiAdapter::new(shared)),
        Backend::Ollama => Arc::new(OllamaAdapter::new(shared)),
        Backend::ClaudeCode => {
            let channel = channel.ok_or_else(|| {
                LlmError::ConfigurationError(
                    "The claude-code backend requires a notify channel".to_string(),
                )
            })?;
            Arc::new(ClaudeCodeAdapter::new(shared, channel))
        }
    };
    Ok(adapter)
}

async fn run_request<A: ProviderAdapter + ?Sized>(
    adapter: &A,
    conversation: &[Message],
    config: &GenerationConfig,
    credentials: &dyn CredentialProvider,
    callbacks: &mut dyn StreamCallbacks,
    cancel: Option<&CancelHandle>,
) -> LifecycleState {
    let shared = adapter.shared();
    let backend = adapter.backend();
    let engine_config = &shared.config;
    let mut lifecycle = RequestLifecycle::new(
        backend.as_str(),
        callbacks,
        engine_config.complete_on_exit_with_content,
    );
    // The ceiling covers the handshake as well as the stream.
    let deadline = tokio::time::Instant::now() + engine_config.timeout;

    let request = match prepare_request(adapter, conversation, config, credentials).await {
        Ok(request) => request,
        Err(error) => {
            lifecycle.fail(error);
            return lifecycle.state();
        }
    };
    tracing::debug!(
        backend = %backend,
        model = request.model(),
        request_id = %request.request_id,
        messages = request.messages.len(),
        "Opening stream"
    );

    let opened = tokio::select! {
        biased;
        _ = wait_cancelled(cancel) => {
            lifecycle.cancel();
            return lifecycle.state();
        }
        opened = tokio::time::timeout_at(deadline, open_with_fallback(adapter, &request)) => opened,
    };
    match opened {
        Ok(Ok(source)) => lifecycle.attach(source),
        Ok(Err(error)) => {
            lifecycle.fail(error);
            return lifecycle.state();
        }
        Err(_) => {
            lifecycle.fail(LlmError::TimeoutError(format!(
                "Request timed out after {} seconds without a response from {}",
                engine_config.timeout.as_secs(),
                backend
            )));
            return lifecycle.state();
        }
    }

    let mode = ReasoningMode::resolve(config.show_thoughts, request.capabilities.redact_reasoning);
    let session = StreamSession::new(
        backend.as_str(),
        adapter.decoder(&request),
        mode,
        config.tools.clone(),
        engine_config,
    );
    session.run_until(&mut lifecycle, deadline, cancel).await
}

/// Validation, credential check and formatting. Nothing here touches the
/// network.
async fn prepare_request<A: ProviderAdapter + ?Sized>(
    adapter: &A,
    conversation: &[Message],
    config: &GenerationConfig,
    credentials: &dyn CredentialProvider,
) -> Result<AdapterRequest, LlmError> {
    let shared = adapter.shared();
    let backend = adapter.backend();

    if Backend::parse(config.model.backend())? != backend {
        return Err(LlmError::ConfigurationError(format!(
            "Model `{}` cannot be served by the {backend} adapter",
            config.model
        )));
    }
    validate_conversation(conversation)?;

    let api_key = match adapter.required_credential() {
        Some(name) => {
            let readiness = credentials.can_proceed(name);
            if !readiness.ok {
                tracing::warn!(
                    backend = %backend,
                    reason = readiness.reason.as_deref().unwrap_or_default(),
                    "Credential check failed"
                );
                return Err(LlmError::missing_credential(name));
            }
            credentials.api_key(name)
        }
        None => None,
    };

    let messages = format_conversation(
        conversation,
        shared.resolver.as_ref(),
        backend.media_support(),
        backend.as_str(),
    )
    .await;

    let base_url = config
        .base_url
        .clone()
        .or_else(|| shared.config.base_url_for(backend.as_str()).map(str::to_string))
        .or_else(|| backend.default_base_url().map(str::to_string))
        .unwrap_or_default();

    Ok(AdapterRequest {
        request_id: uuid::Uuid::new_v4().to_string(),
        config: config.clone(),
        messages,
        api_key,
        capabilities: shared.capabilities.lookup(config.model.model()),
        base_url,
    })
}

/// Open once; on a reasoning parameter rejection, open again without it.
async fn open_with_fallback<A: ProviderAdapter + ?Sized>(
    adapter: &A,
    request: &AdapterRequest,
) -> Result<RawEventStream, LlmError> {
    match adapter.open(request, RequestOptions::default()).await {
        Err(LlmError::ParameterRejection { parameter, message }) => {
            tracing::warn!(
                backend = %adapter.backend(),
                parameter = %parameter,
                message = %message,
                "Backend rejected the reasoning parameter; retrying without it"
            );
            adapter
                .open(
                    request,
                    RequestOptions {
                        reasoning_params: false,
                    },
                )
                .await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_ids_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(Backend::parse(backend.as_str()).unwrap(), backend);
            let json = serde_json::to_string(&backend).unwrap();
            assert_eq!(json, format!("\"{}\"", backend.as_str()));
        }
        assert!(Backend::parse("bedrock").is_err());
    }

    #[test]
    fn local_backends_need_no_credential() {
        assert_eq!(Backend::LmStudio.required_credential(), None);
        assert_eq!(Backend::Ollama.required_credential(), None);
        assert_eq!(Backend::ClaudeCode.required_credential(), None);
        assert_eq!(Backend::Grok.required_credential(), Some("XAI_API_KEY"));
    }

    #[test]
    fn pdfs_are_native_only_where_supported() {
        assert!(Backend::Anthropic.media_support().pdfs);
        assert!(Backend::Google.media_support().pdfs);
        assert!(!Backend::OpenAi.media_support().pdfs);
        assert!(Backend::Ollama.media_support().images);
        assert_eq!(Backend::ClaudeCode.media_support(), MediaSupport::NONE);
    }

    #[test]
    fn claude_code_requires_a_channel() {
        let shared = Arc::new(AdapterShared::with_client(
            reqwest::Client::new(),
            EngineConfig::default(),
        ));
        assert!(create_adapter(Backend::ClaudeCode, shared.clone(), None).is_err());
        let adapter = create_adapter(Backend::Google, shared, None).unwrap();
        assert_eq!(adapter.backend(), Backend::Google);
    }

    #[test]
    fn endpoint_joins_paths() {
        let request = AdapterRequest {
            request_id: "r".into(),
            config: GenerationConfig::new("openai::gpt-4o").unwrap(),
            messages: vec![],
            api_key: None,
            capabilities: ModelCapabilities::default(),
            base_url: "http://localhost:1234/v1/".into(),
        };
        assert_eq!(
            request.endpoint("/chat/completions"),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(request.model(), "gpt-4o");
    }
}
