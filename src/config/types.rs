use serde::{Deserialize, Serialize};

/// Settings for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Label attached to every log line the station emits (default: "station").
    #[serde(default = "default_name")]
    pub name: String,
    /// Snapshots buffered per observer before a slow observer starts skipping
    /// the oldest ones (default: 64).
    #[serde(default = "default_stream_capacity")]
    pub stream_capacity: usize,
    /// When a dispatch cycle publishes its resulting state.
    #[serde(default)]
    pub yield_policy: YieldPolicy,
}

/// Whether an unchanged state is republished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldPolicy {
    /// Publish only when the new state differs from the previous one.
    #[default]
    WhenChanged,
    /// Publish after every dispatch cycle.
    Always,
}

fn default_name() -> String {
    "station".to_string()
}

fn default_stream_capacity() -> usize {
    64
}

impl StationConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }

    pub fn with_yield_policy(mut self, policy: YieldPolicy) -> Self {
        self.yield_policy = policy;
        self
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            stream_capacity: default_stream_capacity(),
            yield_policy: YieldPolicy::default(),
        }
    }
}
