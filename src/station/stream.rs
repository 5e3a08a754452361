//! Change stream handed to station observers.

use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};

type RecvFuture<S> =
    Pin<Box<dyn Future<Output = (Result<S, RecvError>, broadcast::Receiver<S>)> + Send>>;

/// Successive state snapshots published by a station.
///
/// Ends once the station is torn down. An observer that falls more than the
/// configured capacity behind skips the oldest snapshots.
pub struct StateStream<S> {
    pending: Option<RecvFuture<S>>,
}

impl<S: Clone + Send + 'static> StateStream<S> {
    fn new(receiver: broadcast::Receiver<S>) -> Self {
        Self {
            pending: Some(Box::pin(recv_owned(receiver))),
        }
    }

    fn closed() -> Self {
        Self { pending: None }
    }

    /// Wait for the next snapshot; `None` once the station is gone.
    pub async fn next(&mut self) -> Option<S> {
        poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }
}

async fn recv_owned<S: Clone>(
    mut receiver: broadcast::Receiver<S>,
) -> (Result<S, RecvError>, broadcast::Receiver<S>) {
    let result = receiver.recv().await;
    (result, receiver)
}

impl<S: Clone + Send + 'static> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        loop {
            let Some(pending) = self.pending.as_mut() else {
                return Poll::Ready(None);
            };
            let (result, receiver) = ready!(pending.as_mut().poll(cx));
            match result {
                Ok(state) => {
                    self.pending = Some(Box::pin(recv_owned(receiver)));
                    return Poll::Ready(Some(state));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "state observer lagging, oldest snapshots dropped");
                    self.pending = Some(Box::pin(recv_owned(receiver)));
                }
                Err(RecvError::Closed) => {
                    self.pending = None;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// Latest snapshot plus the broadcast side of the change stream.
pub(crate) struct Publisher<S> {
    snapshot: RwLock<S>,
    sender: Mutex<Option<broadcast::Sender<S>>>,
}

impl<S: Clone + Send + 'static> Publisher<S> {
    pub(crate) fn new(initial: S, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            snapshot: RwLock::new(initial),
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Store `state` as the current snapshot and send it to every observer.
    pub(crate) fn publish(&self, state: &S) {
        *self.snapshot.write() = state.clone();
        if let Some(sender) = self.sender.lock().as_ref() {
            // An error only means nobody is subscribed right now.
            let receivers = sender.send(state.clone()).unwrap_or(0);
            tracing::trace!(receivers, "state published");
        }
    }

    pub(crate) fn snapshot(&self) -> S {
        self.snapshot.read().clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.snapshot.read())
    }

    pub(crate) fn subscribe(&self) -> StateStream<S> {
        match self.sender.lock().as_ref() {
            Some(sender) => StateStream::new(sender.subscribe()),
            None => StateStream::closed(),
        }
    }
}

impl<S> Publisher<S> {
    /// Close the change stream; pending observers drain and then end.
    pub(crate) fn close(&self) {
        self.sender.lock().take();
    }
}
