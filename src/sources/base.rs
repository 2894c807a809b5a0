use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::post::Post;

/// Snapshots waiting to be picked up by the view. Every snapshot replaces
/// the previous one, so a short buffer is enough.
pub const SNAPSHOT_BUFFER: usize = 8;

/// Backend that pushes full post snapshots.
pub trait PostSource {
    /// Opens the subscription. Must be called inside a tokio runtime.
    fn subscribe(&self) -> Subscription;
}

/// Receive-only handle on a push channel.
///
/// Owns the task feeding it: dropping the subscription stops the transport,
/// so a view that is mounted again never ends up with two live handlers.
pub struct Subscription {
    rx: mpsc::Receiver<Vec<Post>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<Vec<Post>>, task: JoinHandle<()>) -> Self {
        Self { rx, task: Some(task) }
    }
}

impl Stream for Subscription {
    type Item = Vec<Post>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
