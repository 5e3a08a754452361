//! Drippers: reducers and their composition algebra.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Dripper ──→ State (mutated in place)
//!    ↑          │
//!    │          └──→ Effect ──→ pour(Action)
//!    └──────────────────────────────┘
//! ```
//!
//! - [`Dripper`]: the reducer trait, `(&mut State, &Action) -> Effect<Action>`
//! - [`Drip`]: closure-backed, type-erased dripper
//! - [`combine`]: run several drippers over the same state, in order
//! - [`pullback`] / [`Scope`]: lift a local dripper into a larger state/action
//! - [`DripperBuilder`]: ordered, optional composition of drippers

mod action;
mod builder;
mod combine;
mod reducer;
mod scope;

pub use action::Action;
pub use builder::DripperBuilder;
pub use combine::combine;
pub use reducer::{Drip, Dripper};
pub use scope::{pullback, ActionLens, Scope, StateLens};
