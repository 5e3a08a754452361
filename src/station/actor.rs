//! The single task that owns a station's state.
//!
//! Every mutation arrives as a [`Command`] on one unbounded queue and is
//! handled to completion before the next one is read, so reducer runs and
//! field writes never interleave.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::stream::Publisher;
use super::tasks::{TaskHandle, TaskId, TaskRegistry};
use crate::dripper::Dripper;
use crate::effect::{Cancellation, Effect, Pour};

type Apply<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Returns `true` when the new state should be published.
pub(crate) type YieldCheck<S> = fn(&S, &S) -> bool;

pub(crate) enum Command<S, A> {
    Pour(A),
    Write {
        field: &'static str,
        apply: Apply<S>,
    },
    Finish(TaskId),
    CancelEffects,
    Flush(oneshot::Sender<()>),
}

pub(crate) struct StationActor<D: Dripper> {
    pub(super) name: Arc<str>,
    pub(super) state: D::State,
    pub(super) dripper: D,
    /// `None` publishes after every cycle.
    pub(super) should_yield: Option<YieldCheck<D::State>>,
    pub(super) publisher: Arc<Publisher<D::State>>,
    pub(super) tasks: TaskRegistry,
    pub(super) commands: mpsc::UnboundedSender<Command<D::State, D::Action>>,
    pub(super) receiver: mpsc::UnboundedReceiver<Command<D::State, D::Action>>,
    pub(super) shutdown: Cancellation,
    /// Set when `run` leaves its loop normally.
    pub(super) stopped: bool,
}

impl<D> StationActor<D>
where
    D: Dripper,
    D::State: Clone + Send + Sync,
{
    pub(crate) async fn run(mut self) {
        tracing::debug!(station = %self.name, "station started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }

        self.stopped = true;
    }

    fn handle(&mut self, command: Command<D::State, D::Action>) {
        match command {
            Command::Pour(action) => self.pour(action),
            Command::Write { field, apply } => {
                let before = self.before();
                apply(&mut self.state);
                tracing::debug!(station = %self.name, field, "field written");
                self.publish(before);
            }
            Command::Finish(id) => {
                if self.tasks.finish(id) {
                    tracing::trace!(station = %self.name, task = %id, "effect task finished");
                }
            }
            Command::CancelEffects => {
                let cancelled = self.tasks.cancel_all();
                tracing::debug!(station = %self.name, cancelled, "effects cancelled");
            }
            Command::Flush(respond_to) => {
                if respond_to.send(()).is_err() {
                    tracing::trace!(station = %self.name, "flush response dropped (receiver gone)");
                }
            }
        }
    }

    /// One dispatch cycle: reduce, publish, spawn the effect.
    fn pour(&mut self, action: D::Action) {
        let before = self.before();
        let effect = self.dripper.drip(&mut self.state, &action);
        self.publish(before);
        self.spawn(effect);
    }

    fn before(&self) -> Option<D::State> {
        self.should_yield.map(|_| self.state.clone())
    }

    fn publish(&self, before: Option<D::State>) {
        if let (Some(should_yield), Some(before)) = (self.should_yield, before) {
            if !should_yield(&before, &self.state) {
                tracing::trace!(station = %self.name, "state unchanged, nothing published");
                return;
            }
        }
        self.publisher.publish(&self.state);
    }

    fn spawn(&mut self, effect: Effect<D::Action>) {
        if effect.is_none() {
            return;
        }

        let id = TaskId::new();
        let cancellation = Cancellation::new();
        let sink = {
            let commands = self.commands.clone();
            move |action: D::Action| {
                if commands.send(Command::Pour(action)).is_err() {
                    tracing::trace!("station gone, poured action dropped");
                }
            }
        };
        let pour = Pour::new(sink, cancellation.clone());
        let commands = self.commands.clone();
        let runs = effect.run_count();
        let join = tokio::spawn(async move {
            effect.execute(pour).await;
            // Fails only when the station is already gone.
            let _ = commands.send(Command::Finish(id));
        });

        self.tasks.insert(id, TaskHandle::new(cancellation, join));
        tracing::debug!(station = %self.name, task = %id, runs, "effect task spawned");
    }
}

/// Dropping the actor, after a normal stop or a panicking dripper, cancels
/// every effect and closes the change stream.
impl<D: Dripper> Drop for StationActor<D> {
    fn drop(&mut self) {
        let cancelled = self.tasks.cancel_all();
        self.shutdown.cancel();
        self.receiver.close();
        self.publisher.close();
        if self.stopped {
            tracing::debug!(station = %self.name, cancelled, "station torn down");
        } else {
            tracing::error!(station = %self.name, cancelled, "station actor aborted, torn down");
        }
    }
}
