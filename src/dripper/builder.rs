//! Declarative assembly of a dripper tree.

use super::action::Action;
use super::combine::combine;
use super::reducer::{Drip, Dripper};

/// Ordered list of drippers folded into one with [`combine`].
///
/// ```
/// use dripper::{Action, Drip, DripperBuilder, Effect};
///
/// #[derive(Debug)]
/// enum Op { Add(i32) }
/// impl Action for Op {}
///
/// let logging_enabled = false;
/// let dripper = DripperBuilder::new()
///     .push(Drip::new(|total: &mut i32, op: &Op| {
///         let Op::Add(n) = op;
///         *total += n;
///         Effect::none()
///     }))
///     .push_if(logging_enabled, || Drip::new(|_: &mut i32, _: &Op| Effect::none()))
///     .build();
/// ```
pub struct DripperBuilder<S, A> {
    drippers: Vec<Drip<S, A>>,
}

impl<S: Send + 'static, A: Action> DripperBuilder<S, A> {
    pub fn new() -> Self {
        Self {
            drippers: Vec::new(),
        }
    }

    /// Append a dripper of any concrete type.
    pub fn push<D>(mut self, dripper: D) -> Self
    where
        D: Dripper<State = S, Action = A>,
    {
        self.drippers.push(Drip::erase(dripper));
        self
    }

    /// Append `dripper` if present; an absent branch is skipped entirely.
    pub fn push_optional<D>(self, dripper: Option<D>) -> Self
    where
        D: Dripper<State = S, Action = A>,
    {
        match dripper {
            Some(dripper) => self.push(dripper),
            None => self,
        }
    }

    /// Append the dripper built by `make` only when `condition` holds.
    pub fn push_if<D, F>(self, condition: bool, make: F) -> Self
    where
        D: Dripper<State = S, Action = A>,
        F: FnOnce() -> D,
    {
        if condition {
            self.push(make())
        } else {
            self
        }
    }

    pub fn len(&self) -> usize {
        self.drippers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drippers.is_empty()
    }

    /// Fold everything pushed so far into a single dripper.
    ///
    /// # Panics
    ///
    /// Panics when nothing was pushed: a tree without any dripper is a
    /// composition mistake, not an identity.
    #[track_caller]
    pub fn build(self) -> Drip<S, A> {
        assert!(
            !self.drippers.is_empty(),
            "DripperBuilder::build called without any dripper"
        );
        let mut drippers = self.drippers;
        if drippers.len() == 1 {
            return drippers.remove(0);
        }
        combine(drippers)
    }
}

impl<S: Send + 'static, A: Action> Default for DripperBuilder<S, A> {
    fn default() -> Self {
        Self::new()
    }
}
