//! The station: serialized owner of a state value.
//!
//! ```text
//! pour(action) ──→ command queue ──→ actor: drip ──→ publish ──→ StateStream
//!      ↑                                     │
//!      └──────── Pour ◀── effect task ◀──────┘
//! ```
//!
//! A [`Station`] spawns one actor task on the current Tokio runtime. The actor
//! owns the authoritative state; observers get cloned snapshots. Effects run
//! in their own tasks, tracked by [`TaskId`], and feed actions back through
//! the same queue.

mod actor;
mod fields;
mod stream;
mod tasks;

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::{ConfigError, StationConfig, YieldPolicy};
use crate::dripper::Dripper;
use crate::effect::Cancellation;
use actor::{Command, StationActor, YieldCheck};
use stream::Publisher;
use tasks::TaskRegistry;

pub use fields::{Field, FieldError, FieldTable};
pub use stream::StateStream;
pub use tasks::TaskId;

/// Owner of a state value and its dripper.
///
/// Dropping the station (or calling [`Station::teardown`]) cancels every
/// in-flight effect and closes the change stream. All dispatch and
/// observation methods live on [`StationHandle`], reachable through `Deref`.
pub struct Station<D: Dripper> {
    handle: StationHandle<D::State, D::Action>,
    actor: Option<JoinHandle<()>>,
}

impl<D> Station<D>
where
    D: Dripper,
    D::State: Clone + PartialEq + Send + Sync,
{
    /// Start a station that publishes only changed states.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(initial: D::State, dripper: D) -> Self {
        Self::start(initial, dripper, StationConfig::default(), Some(changed::<D::State>))
    }

    /// Start a station with explicit settings.
    pub fn with_config(initial: D::State, dripper: D, config: StationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let should_yield = match config.yield_policy {
            YieldPolicy::WhenChanged => Some(changed::<D::State> as YieldCheck<D::State>),
            YieldPolicy::Always => None,
        };
        Ok(Self::start(initial, dripper, config, should_yield))
    }
}

impl<D> Station<D>
where
    D: Dripper,
    D::State: Clone + Send + Sync,
{
    /// Start a station for a state that cannot be compared.
    ///
    /// Every dispatch cycle publishes, whatever `config.yield_policy` says.
    pub fn always_yielding(initial: D::State, dripper: D, config: StationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.yield_policy == YieldPolicy::WhenChanged {
            tracing::debug!(station = %config.name, "state has no equality, publishing every cycle");
        }
        Ok(Self::start(initial, dripper, config, None))
    }

    fn start(
        initial: D::State,
        dripper: D,
        config: StationConfig,
        should_yield: Option<YieldCheck<D::State>>,
    ) -> Self {
        let name: Arc<str> = Arc::from(config.name.as_str());
        let publisher = Arc::new(Publisher::new(initial.clone(), config.stream_capacity));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let shutdown = Cancellation::new();
        let (commands, receiver) = mpsc::unbounded_channel();

        let actor = StationActor {
            name: Arc::clone(&name),
            state: initial,
            dripper,
            should_yield,
            publisher: Arc::clone(&publisher),
            tasks: TaskRegistry::new(Arc::clone(&in_flight)),
            commands: commands.clone(),
            receiver,
            shutdown: shutdown.clone(),
            stopped: false,
        };
        let actor = tokio::spawn(actor.run());

        Self {
            handle: StationHandle {
                name,
                commands,
                publisher,
                fields: Arc::new(FieldTable::new()),
                in_flight,
                shutdown,
            },
            actor: Some(actor),
        }
    }

    /// Attach a field table for keyed reads and writes.
    ///
    /// Handles cloned before this call keep the previous (empty) table.
    pub fn with_fields(mut self, fields: FieldTable<D::State>) -> Self {
        self.handle.fields = Arc::new(fields);
        self
    }

    /// Cloneable dispatch and observation handle.
    pub fn handle(&self) -> StationHandle<D::State, D::Action> {
        self.handle.clone()
    }

    /// Cancel every in-flight effect, close the change stream and wait for
    /// the actor to stop.
    pub async fn teardown(mut self) {
        self.handle.shutdown.cancel();
        if let Some(actor) = self.actor.take() {
            if let Err(error) = actor.await {
                tracing::error!(station = %self.handle.name, error = %error, "station actor failed");
            }
        }
    }
}

impl<D: Dripper> Deref for Station<D> {
    type Target = StationHandle<D::State, D::Action>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<D: Dripper> Drop for Station<D> {
    fn drop(&mut self) {
        self.handle.shutdown.cancel();
    }
}

fn changed<S: PartialEq>(before: &S, after: &S) -> bool {
    before != after
}

/// Dispatch and observation surface shared by everyone talking to a station.
pub struct StationHandle<S, A> {
    name: Arc<str>,
    commands: mpsc::UnboundedSender<Command<S, A>>,
    publisher: Arc<Publisher<S>>,
    fields: Arc<FieldTable<S>>,
    in_flight: Arc<AtomicUsize>,
    shutdown: Cancellation,
}

impl<S, A> Clone for StationHandle<S, A> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            commands: self.commands.clone(),
            publisher: Arc::clone(&self.publisher),
            fields: Arc::clone(&self.fields),
            in_flight: Arc::clone(&self.in_flight),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S, A> StationHandle<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `action` for the station. Fire-and-forget.
    ///
    /// After teardown this does nothing.
    pub fn pour(&self, action: A) {
        self.send(Command::Pour(action));
    }

    /// Observe every snapshot published from now on.
    pub fn subscribe(&self) -> StateStream<S> {
        self.publisher.subscribe()
    }

    /// Latest published snapshot.
    pub fn state(&self) -> S {
        self.publisher.snapshot()
    }

    /// Read one field of the latest snapshot.
    pub fn get<V: Clone>(&self, field: &Field<S, V>) -> V {
        self.publisher.read(|state| field.get(state).clone())
    }

    /// Queue a write of one field; published like a dispatch.
    pub fn set<V: Send + 'static>(&self, field: &Field<S, V>, value: V) {
        let field = *field;
        self.send(Command::Write {
            field: field.name(),
            apply: Box::new(move |state: &mut S| *field.get_mut(state) = value),
        });
    }

    /// Read a field registered in the station's [`FieldTable`].
    pub fn read_field<V: 'static>(&self, key: &str) -> Result<V, FieldError> {
        self.publisher.read(|state| self.fields.read::<V>(key, state))
    }

    /// Queue a write of a field registered in the station's [`FieldTable`].
    pub fn write_field<V: Send + 'static>(&self, key: &str, value: V) -> Result<(), FieldError> {
        let field = self.fields.lookup::<V>(key)?;
        self.send(Command::Write {
            field: field.key(),
            apply: Box::new(move |state: &mut S| field.write(state, Box::new(value))),
        });
        Ok(())
    }

    /// Resolve once every command queued before this call has been handled.
    ///
    /// Returns immediately after teardown.
    pub async fn flush(&self) {
        let (respond_to, receiver) = oneshot::channel();
        if self.commands.send(Command::Flush(respond_to)).is_err() {
            return;
        }
        let _ = receiver.await;
    }

    /// Cancel every in-flight effect without tearing the station down.
    pub fn cancel_effects(&self) {
        self.send(Command::CancelEffects);
    }

    /// Number of effect tasks currently tracked.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether the station has been torn down.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.commands.is_closed()
    }

    fn send(&self, command: Command<S, A>) {
        if self.shutdown.is_cancelled() || self.commands.send(command).is_err() {
            tracing::trace!(station = %self.name, "station torn down, command ignored");
        }
    }
}
