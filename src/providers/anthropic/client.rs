//! Anthropic adapter

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::streaming::AnthropicStreamDecoder;
use super::transformers::{build_messages_body, API_VERSION};
use crate::error::LlmError;
use crate::providers::http::{build_headers, send_streaming, StreamPost};
use crate::providers::{AdapterRequest, AdapterShared, Backend, ProviderAdapter, RequestOptions};
use crate::streaming::{sse_events, RawEventStream, WireDecoder};

pub struct AnthropicAdapter {
    shared: Arc<AdapterShared>,
}

impl AnthropicAdapter {
    pub fn new(shared: Arc<AdapterShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn backend(&self) -> Backend {
        Backend::Anthropic
    }

    fn shared(&self) -> &AdapterShared {
        &self.shared
    }

    async fn open(
        &self,
        request: &AdapterRequest,
        options: RequestOptions,
    ) -> Result<RawEventStream, LlmError> {
        let (body, reasoning) = build_messages_body(request, options);

        let mut auth = vec![("anthropic-version", API_VERSION)];
        if let Some(key) = request.api_key.as_ref() {
            auth.push(("x-api-key", key.expose_secret()));
        }

        let post = StreamPost {
            url: request.endpoint("messages"),
            headers: build_headers(&auth, &request.config.extra_headers)?,
            body,
            reasoning,
        };
        let response = send_streaming(&self.shared, &post).await?;
        Ok(sse_events(response))
    }

    fn decoder(&self, _request: &AdapterRequest) -> Box<dyn WireDecoder> {
        Box::new(AnthropicStreamDecoder::new(
            self.shared.config.redaction_placeholder.clone(),
        ))
    }
}
