//! Ollama adapter

use std::sync::Arc;

use async_trait::async_trait;

use super::streaming::OllamaStreamDecoder;
use super::transformers::build_chat_body;
use crate::error::LlmError;
use crate::providers::http::{build_headers, send_streaming, StreamPost};
use crate::providers::{AdapterRequest, AdapterShared, Backend, ProviderAdapter, RequestOptions};
use crate::streaming::{ndjson_events, RawEventStream, WireDecoder};

pub struct OllamaAdapter {
    shared: Arc<AdapterShared>,
}

impl OllamaAdapter {
    pub fn new(shared: Arc<AdapterShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn backend(&self) -> Backend {
        Backend::Ollama
    }

    fn shared(&self) -> &AdapterShared {
        &self.shared
    }

    async fn open(
        &self,
        request: &AdapterRequest,
        options: RequestOptions,
    ) -> Result<RawEventStream, LlmError> {
        let (body, reasoning) = build_chat_body(request, options);
        let post = StreamPost {
            url: request.endpoint("api/chat"),
            headers: build_headers(&[], &request.config.extra_headers)?,
            body,
            reasoning,
        };
        let response = send_streaming(&self.shared, &post).await?;
        Ok(ndjson_events(response))
    }

    fn decoder(&self, _request: &AdapterRequest) -> Box<dyn WireDecoder> {
        Box::new(OllamaStreamDecoder::new())
    }
}
