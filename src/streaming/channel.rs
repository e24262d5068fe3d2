//! Notify channel transport
//!
//! Some producers run behind a process boundary and publish their output on
//! a channel keyed by request id instead of answering a streaming call. The
//! engine subscribes first, then issues a separate start call carrying the
//! same id. Events are tagged `data | error | stderr | done`.
//!
//! `ChannelHub` is an in-process implementation on tokio mpsc channels.
//! Dropping a subscription unregisters it, so late publishes are discarded.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::events::{RawEvent, RawEventStream};
use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelEventKind {
    Data,
    Error,
    Stderr,
    Done,
}

/// Event as published on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEvent {
    #[serde(rename = "type")]
    pub kind: ChannelEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, rename = "exitCode", skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ChannelEvent {
    pub fn data(payload: impl Into<String>) -> Self {
        Self {
            kind: ChannelEventKind::Data,
            payload: Some(payload.into()),
            exit_code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ChannelEventKind::Error,
            payload: Some(message.into()),
            exit_code: None,
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            kind: ChannelEventKind::Stderr,
            payload: Some(text.into()),
            exit_code: None,
        }
    }

    pub fn done(exit_code: Option<i32>) -> Self {
        Self {
            kind: ChannelEventKind::Done,
            payload: None,
            exit_code,
        }
    }
}

impl From<ChannelEvent> for RawEvent {
    fn from(event: ChannelEvent) -> Self {
        let payload = event.payload.unwrap_or_default();
        match event.kind {
            ChannelEventKind::Data => RawEvent::Data(payload),
            ChannelEventKind::Error => RawEvent::Error(payload),
            ChannelEventKind::Stderr => RawEvent::Stderr(payload),
            ChannelEventKind::Done => RawEvent::Done {
                exit_code: event.exit_code,
            },
        }
    }
}

/// Publish/subscribe event source keyed by request id.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Register interest in `request_id`. Must be called before `start`.
    async fn subscribe(&self, request_id: &str) -> Result<RawEventStream, LlmError>;

    /// Ask the producer to begin work for `request_id`.
    async fn start(&self, request_id: &str, payload: serde_json::Value) -> Result<(), LlmError>;
}

type StartHandler = Arc<dyn Fn(String, serde_json::Value) -> Result<(), LlmError> + Send + Sync>;

#[derive(Default)]
struct HubInner {
    subscribers: HashMap<String, mpsc::UnboundedSender<ChannelEvent>>,
}

/// In-process notify channel
#[derive(Clone, Default)]
pub struct ChannelHub {
    inner: Arc<Mutex<HubInner>>,
    on_start: Option<StartHandler>,
}

impl std::fmt::Debug for ChannelHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHub")
            .field("subscribers", &self.lock().subscribers.len())
            .finish()
    }
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the producer launched by `start`.
    pub fn with_start_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(String, serde_json::Value) -> Result<(), LlmError> + Send + Sync + 'static,
    {
        self.on_start = Some(Arc::new(handler));
        self
    }

    /// Deliver an event. Returns `false` when nobody is subscribed.
    pub fn publish(&self, request_id: &str, event: ChannelEvent) -> bool {
        let inner = self.lock();
        match inner.subscribers.get(request_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                tracing::trace!(request_id, "Dropping event for released subscription");
                false
            }
        }
    }

    pub fn is_subscribed(&self, request_id: &str) -> bool {
        self.lock().subscribers.contains_key(request_id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl NotifyChannel for ChannelHub {
    async fn subscribe(&self, request_id: &str) -> Result<RawEventStream, LlmError> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut inner = self.lock();
            if inner.subscribers.contains_key(request_id) {
                return Err(LlmError::InternalError(format!(
                    "request id `{request_id}` is already subscribed"
                )));
            }
            inner.subscribers.insert(request_id.to_string(), tx);
        }
        Ok(Box::pin(Subscription {
            rx,
            hub: self.inner.clone(),
            request_id: request_id.to_string(),
        }))
    }

    async fn start(&self, request_id: &str, payload: serde_json::Value) -> Result<(), LlmError> {
        match &self.on_start {
            Some(handler) => handler(request_id.to_string(), payload),
            None => Err(LlmError::ConfigurationError(
                "notify channel has no producer registered".to_string(),
            )),
        }
    }
}

/// Receiving half of a hub subscription. Unregisters on drop.
struct Subscription {
    rx: mpsc::UnboundedReceiver<ChannelEvent>,
    hub: Arc<Mutex<HubInner>>,
    request_id: String,
}

impl Stream for Subscription {
    type Item = RawEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|event| event.map(RawEvent::from))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut inner = self.hub.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.subscribers.remove(&self.request_id);
        tracing::debug!(request_id = %self.request_id, "Channel subscription released");
    }
}
