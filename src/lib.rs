//! Dripper: unidirectional state management.
//!
//! ```text
//! StationHandle::pour(action)
//!        │
//!        ▼
//!   Station actor ──→ Dripper::drip(&mut state, &action) ──→ Effect
//!        │                                                    │
//!        ├──→ StateStream (snapshots)                          │
//!        └──◀── Pour::pour(action) ◀── effect task ◀───────────┘
//! ```
//!
//! - [`dripper`]: the reducer trait and its composition algebra
//! - [`effect`]: deferred asynchronous work returned by drippers
//! - [`station`]: the serialized owner of a state value
//! - [`test_station`]: deterministic driver for dripper tests
//! - [`config`]: station settings, loadable from TOML
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod dripper;
pub mod effect;
pub mod logging;
pub mod station;
pub mod test_station;

pub use config::{ConfigError, StationConfig, YieldPolicy};
pub use dripper::{combine, pullback, Action, ActionLens, Drip, Dripper, DripperBuilder, Scope, StateLens};
pub use effect::{Cancellation, Effect, Pour, FAULT_TARGET};
pub use station::{Field, FieldError, FieldTable, StateStream, Station, StationHandle, TaskId};
pub use test_station::TestStation;
