//! OpenAI-compatible adapter

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::streaming::OpenAiStreamDecoder;
use super::transformers::build_chat_body;
use super::OpenAiFlavor;
use crate::error::LlmError;
use crate::providers::http::{build_headers, send_streaming, StreamPost};
use crate::providers::{AdapterRequest, AdapterShared, Backend, ProviderAdapter, RequestOptions};
use crate::streaming::{sse_events, RawEventStream, WireDecoder};

pub struct OpenAiAdapter {
    flavor: OpenAiFlavor,
    shared: Arc<AdapterShared>,
}

impl OpenAiAdapter {
    pub fn new(flavor: OpenAiFlavor, shared: Arc<AdapterShared>) -> Self {
        Self { flavor, shared }
    }

    pub fn flavor(&self) -> OpenAiFlavor {
        self.flavor
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn backend(&self) -> Backend {
        self.flavor.backend()
    }

    fn shared(&self) -> &AdapterShared {
        &self.shared
    }

    async fn open(
        &self,
        request: &AdapterRequest,
        options: RequestOptions,
    ) -> Result<RawEventStream, LlmError> {
        let (body, reasoning) = build_chat_body(self.flavor, request, options);

        let bearer = request
            .api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key.expose_secret()));
        let mut auth = Vec::new();
        if let Some(bearer) = bearer.as_deref() {
            auth.push(("authorization", bearer));
        }
        if self.flavor == OpenAiFlavor::OpenRouter {
            auth.push(("x-title", "unistream"));
        }

        let post = StreamPost {
            url: request.endpoint("chat/completions"),
            headers: build_headers(&auth, &request.config.extra_headers)?,
            body,
            reasoning,
        };
        let response = send_streaming(&self.shared, &post).await?;
        Ok(sse_events(response))
    }

    fn decoder(&self, _request: &AdapterRequest) -> Box<dyn WireDecoder> {
        Box::new(OpenAiStreamDecoder::new())
    }
}
