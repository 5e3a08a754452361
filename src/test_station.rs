//! Deterministic driver for dripper tests.
//!
//! A [`TestStation`] runs a dripper without any background task. Each poured
//! action is reduced, the resulting state is compared against an expectation,
//! and the effect is driven to completion before the call returns. Actions
//! the effect emits are queued and must be consumed with
//! [`TestStation::receive`] before [`TestStation::finish`].
//!
//! ```
//! use dripper::{Action, Drip, Effect, TestStation};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Op { Ping, Pong }
//! impl Action for Op {}
//!
//! # tokio_test_runtime(async {
//! let dripper = Drip::new(|hits: &mut u32, op: &Op| match op {
//!     Op::Ping => Effect::send(Op::Pong),
//!     Op::Pong => { *hits += 1; Effect::none() }
//! });
//!
//! let mut station = TestStation::new(0, dripper);
//! station.pour(Op::Ping, |_| {}).await;
//! let received = station.receive(|hits| *hits = 1).await;
//! assert_eq!(received, Op::Pong);
//! station.finish();
//! # });
//! # fn tokio_test_runtime(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dripper::Dripper;
use crate::effect::{Cancellation, Pour};

/// Exhaustive, single-threaded test harness around a dripper.
pub struct TestStation<D: Dripper> {
    dripper: D,
    state: D::State,
    received: VecDeque<D::Action>,
}

impl<D> TestStation<D>
where
    D: Dripper,
    D::State: Clone + PartialEq + Debug,
    D::Action: Debug,
{
    pub fn new(initial: D::State, dripper: D) -> Self {
        Self {
            dripper,
            state: initial,
            received: VecDeque::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &D::State {
        &self.state
    }

    /// Actions emitted by effects and not yet received.
    pub fn pending(&self) -> usize {
        self.received.len()
    }

    /// Reduce `action` and assert the resulting state.
    ///
    /// `expect` receives a copy of the state before the action and must turn
    /// it into the state the dripper is expected to produce.
    ///
    /// # Panics
    ///
    /// Panics when the reduced state differs from the expectation.
    pub async fn pour<F>(&mut self, action: D::Action, expect: F)
    where
        F: FnOnce(&mut D::State),
    {
        self.step(action, expect, "pour").await;
    }

    /// Reduce the oldest action emitted by an effect and assert the resulting
    /// state. Returns the received action.
    ///
    /// # Panics
    ///
    /// Panics when no action is pending or the state differs from the
    /// expectation.
    pub async fn receive<F>(&mut self, expect: F) -> D::Action
    where
        F: FnOnce(&mut D::State),
        D::Action: Clone,
    {
        let Some(action) = self.received.pop_front() else {
            panic!("expected an action from an effect, but none was emitted");
        };
        self.step(action.clone(), expect, "receive").await;
        action
    }

    /// Assert that every emitted action was received.
    ///
    /// # Panics
    ///
    /// Panics when actions are still pending.
    pub fn finish(self) {
        assert!(
            self.received.is_empty(),
            "{} action(s) emitted by effects were never received: {:?}",
            self.received.len(),
            self.received
        );
    }

    async fn step<F>(&mut self, action: D::Action, expect: F, origin: &str)
    where
        F: FnOnce(&mut D::State),
    {
        let mut expected = self.state.clone();
        expect(&mut expected);

        let effect = self.dripper.drip(&mut self.state, &action);
        assert_eq!(
            self.state, expected,
            "state after {origin} of {action:?} does not match the expectation"
        );

        if effect.is_none() {
            return;
        }
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let pour = {
            let emitted = Arc::clone(&emitted);
            Pour::new(move |action: D::Action| emitted.lock().push(action), Cancellation::new())
        };
        effect.execute(pour).await;
        self.received.extend(emitted.lock().drain(..));
    }
}
