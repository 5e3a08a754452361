//! Side effects returned by drippers.
//!
//! An [`Effect`] is a list of deferred asynchronous runs. The station executes
//! all runs of one effect concurrently inside a single tracked task and hands
//! each of them a [`Pour`] through which follow-up actions are emitted.
//!
//! ```text
//! drip(state, action) ──→ Effect ──→ task (TaskId)
//!                                     │  run 1 ─┐
//!                                     │  run 2 ─┼─→ pour(action) ──→ station
//!                                     │  run n ─┘
//! ```

mod cancel;
mod pour;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;

pub use cancel::Cancellation;
pub use pour::Pour;

/// Diagnostic target used for effect failures nobody handled.
pub const FAULT_TARGET: &str = "dripper::fault";

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Work<A> = Box<dyn FnOnce(Pour<A>) -> BoxFuture + Send + 'static>;

/// Deferred, cancellable asynchronous work that may emit actions.
#[must_use = "effects do nothing unless returned to a station"]
pub struct Effect<A> {
    runs: Vec<Work<A>>,
}

impl<A: Send + 'static> Effect<A> {
    /// The empty effect. Stations spawn nothing for it.
    pub fn none() -> Self {
        Self { runs: Vec::new() }
    }

    pub fn is_none(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of runs that will execute concurrently.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Wrap asynchronous work.
    ///
    /// An error returned by `work` is reported once on [`FAULT_TARGET`] and
    /// then dropped; the station keeps running.
    pub fn run<F, Fut>(work: F) -> Self
    where
        F: FnOnce(Pour<A>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_work(move |pour| {
            Box::pin(async move {
                if let Err(error) = work(pour).await {
                    report_fault(&error);
                }
            })
        })
    }

    /// Wrap asynchronous work with an error handler.
    ///
    /// `on_error` receives the error together with the same emit handle, so it
    /// can pour a corrective action.
    pub fn run_catching<F, Fut, H>(work: F, on_error: H) -> Self
    where
        F: FnOnce(Pour<A>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        H: FnOnce(anyhow::Error, Pour<A>) + Send + 'static,
    {
        Self::from_work(move |pour| {
            let handler_pour = pour.clone();
            Box::pin(async move {
                if let Err(error) = work(pour).await {
                    tracing::debug!(error = %error, "effect failed, running error handler");
                    on_error(error, handler_pour);
                }
            })
        })
    }

    /// Effect that immediately pours a single action.
    pub fn send(action: A) -> Self {
        Self::from_work(move |pour| Box::pin(async move { pour.pour(action) }))
    }

    /// Run both effects; neither replaces the other.
    pub fn merge(mut self, other: Self) -> Self {
        self.runs.extend(other.runs);
        self
    }

    pub fn merge_all<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        effects.into_iter().fold(Self::none(), Self::merge)
    }

    /// Re-target the actions this effect emits.
    pub fn map<B, F>(self, f: F) -> Effect<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let embed: Arc<dyn Fn(A) -> B + Send + Sync> = Arc::new(f);
        let runs = self
            .runs
            .into_iter()
            .map(|work| {
                let embed = Arc::clone(&embed);
                Box::new(move |pour: Pour<B>| work(pour.scoped(embed))) as Work<B>
            })
            .collect();
        Effect { runs }
    }

    /// Drive every run to completion, concurrently.
    ///
    /// Dropping the returned future aborts the runs still in flight.
    pub(crate) async fn execute(self, pour: Pour<A>) {
        let mut set = JoinSet::new();
        for work in self.runs {
            set.spawn(work(pour.clone()));
        }
        while let Some(joined) = set.join_next().await {
            if let Err(error) = joined {
                if error.is_panic() {
                    tracing::error!(target: FAULT_TARGET, "effect run panicked");
                }
            }
        }
    }

    fn from_work<F>(work: F) -> Self
    where
        F: FnOnce(Pour<A>) -> BoxFuture + Send + 'static,
    {
        Self {
            runs: vec![Box::new(work)],
        }
    }
}

impl<A: Send + 'static> Default for Effect<A> {
    fn default() -> Self {
        Self::none()
    }
}

impl<A> std::fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("runs", &self.runs.len())
            .finish()
    }
}

fn report_fault(error: &anyhow::Error) {
    tracing::error!(
        target: FAULT_TARGET,
        error = %error,
        "effect failed without an error handler"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use parking_lot::Mutex;

    fn recording_pour() -> (Pour<i32>, Arc<Mutex<Vec<i32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |value| seen.lock().push(value)
        };
        (Pour::new(sink, Cancellation::new()), seen)
    }

    #[test]
    fn none_is_empty() {
        let effect: Effect<i32> = Effect::none();
        assert!(effect.is_none());
        assert!(Effect::<i32>::default().is_none());
    }

    #[test]
    fn merge_keeps_every_run() {
        let effect = Effect::send(1).merge(Effect::none()).merge(Effect::send(2));
        assert_eq!(effect.run_count(), 2);

        let all = Effect::merge_all(vec![Effect::send(1), Effect::send(2), Effect::send(3)]);
        assert_eq!(all.run_count(), 3);
    }

    #[tokio::test]
    async fn execute_runs_all_merged_effects() {
        let (pour, seen) = recording_pour();
        let effect = Effect::send(1).merge(Effect::run(|pour: Pour<i32>| async move {
            pour.pour(2);
            pour.pour(3);
            Ok(())
        }));

        effect.execute(pour).await;

        let mut values = seen.lock().clone();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn error_handler_receives_error_and_pour() {
        let (pour, seen) = recording_pour();
        let effect = Effect::run_catching(
            |_pour: Pour<i32>| async move { Err::<(), _>(anyhow!("boom")) },
            |error, pour| {
                assert_eq!(error.to_string(), "boom");
                pour.pour(-1);
            },
        );

        effect.execute(pour).await;

        assert_eq!(*seen.lock(), vec![-1]);
    }

    #[tokio::test]
    async fn unhandled_error_is_swallowed() {
        let (pour, seen) = recording_pour();
        Effect::run(|_pour: Pour<i32>| async move { Err::<(), _>(anyhow!("ignored")) })
            .execute(pour)
            .await;
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn panicking_run_does_not_stop_siblings() {
        let (pour, seen) = recording_pour();
        let effect = Effect::run(|pour: Pour<i32>| async move {
            if pour.is_cancelled() {
                return anyhow::Ok(());
            }
            panic!("run exploded")
        })
        .merge(Effect::send(7));

        effect.execute(pour).await;

        assert_eq!(*seen.lock(), vec![7]);
    }

    #[tokio::test]
    async fn map_retargets_emitted_actions() {
        let (pour, seen) = recording_pour();
        let local: Effect<u8> = Effect::send(3);
        local.map(|value: u8| i32::from(value) + 100).execute(pour).await;
        assert_eq!(*seen.lock(), vec![103]);
    }
}
