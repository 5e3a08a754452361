//! Shared fixtures for station integration tests.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use dripper::{Action, Drip, Effect, Pour, StateStream, FAULT_TARGET};
use parking_lot::Mutex;
use rand::Rng;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub const WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Counter {
    pub counter: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CounterAction {
    Increase(i64),
    Set(i64),
    Reset,
    /// Sleeps briefly, then sets a value in 1..=100.
    Randomize,
    /// Effect fails without an error handler.
    Fail,
    /// Effect fails; the handler sets the counter to -1.
    FailHandled,
    /// Effect parks until cancelled, keeping its `Pour` in the tracker.
    Park,
}

impl Action for CounterAction {}

/// Observes what parked effects did.
#[derive(Clone, Default)]
pub struct EffectTracker {
    /// Parked effect futures dropped (completed or aborted).
    pub dropped: Arc<AtomicUsize>,
    /// Emit handles captured by parked effects.
    pub pours: Arc<Mutex<Vec<Pour<CounterAction>>>>,
}

impl EffectTracker {
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct DropGuard(Arc<AtomicUsize>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn counter() -> Drip<Counter, CounterAction> {
    counter_with(EffectTracker::default())
}

pub fn counter_with(tracker: EffectTracker) -> Drip<Counter, CounterAction> {
    Drip::new(move |state: &mut Counter, action: &CounterAction| {
        match action {
            CounterAction::Increase(by) => state.counter += by,
            CounterAction::Set(value) => state.counter = *value,
            CounterAction::Reset => state.counter = 0,
            CounterAction::Randomize => {
                return Effect::run(|pour| async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let value = rand::thread_rng().gen_range(1..=100);
                    pour.pour(CounterAction::Set(value));
                    Ok(())
                });
            }
            CounterAction::Fail => {
                return Effect::run(|_pour| async move { Err::<(), _>(anyhow!("backend unreachable")) });
            }
            CounterAction::FailHandled => {
                return Effect::run_catching(
                    |_pour| async move { Err::<(), _>(anyhow!("backend unreachable")) },
                    |_error, pour| pour.pour(CounterAction::Set(-1)),
                );
            }
            CounterAction::Park => {
                let tracker = tracker.clone();
                return Effect::run(move |pour| async move {
                    let _guard = DropGuard(Arc::clone(&tracker.dropped));
                    tracker.pours.lock().push(pour);
                    std::future::pending::<()>().await;
                    Ok(())
                });
            }
        }
        Effect::none()
    })
}

/// Pull snapshots until one satisfies `done`, returning all of them.
pub async fn collect_until<F>(stream: &mut StateStream<Counter>, done: F) -> Vec<Counter>
where
    F: Fn(&Counter) -> bool,
{
    let mut seen = Vec::new();
    let result = tokio::time::timeout(WAIT, async {
        while let Some(state) = stream.next().await {
            let finished = done(&state);
            seen.push(state);
            if finished {
                return;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for snapshot, saw {seen:?}");
    seen
}

/// Poll `condition` until it holds or the wait expires.
pub async fn eventually<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

/// Counts ERROR events on the fault target.
#[derive(Clone, Default)]
pub struct FaultCounter {
    count: Arc<AtomicUsize>,
}

impl FaultCounter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for FaultCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() == FAULT_TARGET && *metadata.level() == Level::ERROR {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
