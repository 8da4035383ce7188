// ── Reactive row streams ──
//
// Subscription types for consuming collection changes.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::draft::Rows;
use crate::model::Resource;

/// A subscription to one collection's rows.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via `changed()` or by converting to a `Stream`.
pub struct RowStream<R: Resource> {
    current: Rows<R>,
    receiver: watch::Receiver<Rows<R>>,
}

impl<R: Resource> RowStream<R> {
    pub(crate) fn new(receiver: watch::Receiver<Rows<R>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at subscription time.
    pub fn current(&self) -> &Rows<R> {
        &self.current
    }

    /// The latest snapshot (may have moved on since subscription).
    pub fn latest(&self) -> Rows<R> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the controller behind the subscription is gone.
    pub async fn changed(&mut self) -> Option<Rows<R>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> RowWatchStream<R> {
        RowWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot once, then a fresh one for every
/// mutation of the collection.
pub struct RowWatchStream<R: Resource> {
    inner: WatchStream<Rows<R>>,
}

impl<R: Resource> Stream for RowWatchStream<R> {
    type Item = Rows<R>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // `WatchStream` is Unpin when the item is, and `Rows` always is.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
