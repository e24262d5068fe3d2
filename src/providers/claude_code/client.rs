//! Claude Code adapter

use std::sync::Arc;

use async_trait::async_trait;

use super::streaming::ClaudeCodeStreamDecoder;
use super::transformers::build_start_payload;
use crate::error::LlmError;
use crate::providers::{AdapterRequest, AdapterShared, Backend, ProviderAdapter, RequestOptions};
use crate::streaming::{NotifyChannel, RawEventStream, WireDecoder};

pub struct ClaudeCodeAdapter {
    shared: Arc<AdapterShared>,
    channel: Arc<dyn NotifyChannel>,
}

impl ClaudeCodeAdapter {
    pub fn new(shared: Arc<AdapterShared>, channel: Arc<dyn NotifyChannel>) -> Self {
        Self { shared, channel }
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeCodeAdapter {
    fn backend(&self) -> Backend {
        Backend::ClaudeCode
    }

    fn shared(&self) -> &AdapterShared {
        &self.shared
    }

    async fn open(
        &self,
        request: &AdapterRequest,
        options: RequestOptions,
    ) -> Result<RawEventStream, LlmError> {
        // Subscribe before starting so no early event is lost.
        let subscription = self.channel.subscribe(&request.request_id).await?;
        let payload = build_start_payload(request, options);
        if let Err(error) = self.channel.start(&request.request_id, payload).await {
            tracing::warn!(request_id = %request.request_id, "Claude Code start failed");
            drop(subscription);
            return Err(error);
        }
        Ok(subscription)
    }

    fn decoder(&self, _request: &AdapterRequest) -> Box<dyn WireDecoder> {
        Box::new(ClaudeCodeStreamDecoder::new())
    }
}
