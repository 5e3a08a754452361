//! Base trait for actions dispatched into a station.

/// Marker trait for action values.
///
/// Actions represent:
/// - User intents (button presses, text edits)
/// - Results of side effects (timers, computed values)
///
/// Actions are immutable once built and are handed to drippers by reference,
/// so a combined dripper can show the same action to every constituent.
pub trait Action: Send + 'static {}
