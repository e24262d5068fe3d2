//! Gemini adapter

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::streaming::GeminiStreamDecoder;
use super::transformers::build_generate_body;
use crate::error::LlmError;
use crate::providers::http::{build_headers, send_streaming, StreamPost};
use crate::providers::{AdapterRequest, AdapterShared, Backend, ProviderAdapter, RequestOptions};
use crate::streaming::{sse_events, RawEventStream, WireDecoder};

pub struct GeminiAdapter {
    shared: Arc<AdapterShared>,
}

impl GeminiAdapter {
    pub fn new(shared: Arc<AdapterShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn backend(&self) -> Backend {
        Backend::Google
    }

    fn shared(&self) -> &AdapterShared {
        &self.shared
    }

    async fn open(
        &self,
        request: &AdapterRequest,
        options: RequestOptions,
    ) -> Result<RawEventStream, LlmError> {
        let (body, reasoning) = build_generate_body(request, options);

        let mut auth = Vec::new();
        if let Some(key) = request.api_key.as_ref() {
            auth.push(("x-goog-api-key", key.expose_secret()));
        }

        let post = StreamPost {
            url: request.endpoint(&format!(
                "models/{}:streamGenerateContent?alt=sse",
                request.model()
            )),
            headers: build_headers(&auth, &request.config.extra_headers)?,
            body,
            reasoning,
        };
        let response = send_streaming(&self.shared, &post).await?;
        Ok(sse_events(response))
    }

    fn decoder(&self, _request: &AdapterRequest) -> Box<dyn WireDecoder> {
        Box::new(GeminiStreamDecoder::new())
    }
}
