//! Station configuration.
//!
//! A station is configured with a [`StationConfig`], either built in code or
//! loaded from TOML:
//!
//! ```toml
//! name = "counter"
//! stream_capacity = 64
//! yield_policy = "when_changed"   # or "always"
//! ```

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{StationConfig, YieldPolicy};
