//! Cancellation utilities
//!
//! A `CancelHandle` is the caller's way to release a request early. Once
//! cancelled, the request drops its subscription and fires no further
//! callbacks.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The request observing this handle stops at its
    /// next suspension point and drops the raw event source, which closes the
    /// HTTP connection or unsubscribes from the channel.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Resolves when `cancel` fires; never resolves without a handle.
pub(crate) async fn wait_cancelled(cancel: Option<&CancelHandle>) {
    match cancel {
        Some(handle) => handle.cancelled().await,
        None => std::future::pending().await,
    }
}
