use std::sync::Arc;

use super::cancel::Cancellation;

/// Emit handle given to every effect run.
///
/// Each call to [`Pour::pour`] queues one more dispatch cycle on the station
/// that spawned the effect. Once the owning task is cancelled (teardown,
/// explicit cancellation or completion) calls become no-ops.
pub struct Pour<A> {
    sink: Arc<dyn Fn(A) + Send + Sync>,
    cancellation: Cancellation,
}

impl<A> Clone for Pour<A> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            cancellation: self.cancellation.clone(),
        }
    }
}

impl<A: Send + 'static> Pour<A> {
    pub fn new<F>(sink: F, cancellation: Cancellation) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
            cancellation,
        }
    }

    /// Send an action back into the station.
    pub fn pour(&self, action: A) {
        if self.cancellation.is_cancelled() {
            tracing::trace!("pour after cancellation ignored");
            return;
        }
        (self.sink)(action);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the owning task has been cancelled.
    ///
    /// Long-running work can `select!` on this to exit promptly.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    /// Emit handle for a local action type that embeds into this one.
    pub(crate) fn scoped<L: Send + 'static>(&self, embed: Arc<dyn Fn(L) -> A + Send + Sync>) -> Pour<L> {
        let sink = Arc::clone(&self.sink);
        Pour {
            sink: Arc::new(move |local: L| sink(embed(local))),
            cancellation: self.cancellation.clone(),
        }
    }
}

impl<A> std::fmt::Debug for Pour<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pour")
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording() -> (Pour<i32>, Arc<Mutex<Vec<i32>>>, Cancellation) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cancellation = Cancellation::new();
        let sink = {
            let seen = Arc::clone(&seen);
            move |value| seen.lock().push(value)
        };
        (Pour::new(sink, cancellation.clone()), seen, cancellation)
    }

    #[test]
    fn pour_forwards_until_cancelled() {
        let (pour, seen, cancellation) = recording();
        pour.pour(1);
        pour.pour(2);
        cancellation.cancel();
        pour.pour(3);
        assert_eq!(*seen.lock(), vec![1, 2]);
        assert!(pour.is_cancelled());
    }

    #[test]
    fn scoped_pour_embeds_and_shares_cancellation() {
        let (pour, seen, cancellation) = recording();
        let local: Pour<u8> = pour.scoped(Arc::new(|value: u8| i32::from(value) * 10));
        local.pour(4);
        cancellation.cancel();
        local.pour(5);
        assert_eq!(*seen.lock(), vec![40]);
        assert!(local.is_cancelled());
    }
}
