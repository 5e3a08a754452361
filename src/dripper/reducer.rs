//! Dripper trait and its closure-backed implementation.

use std::sync::Arc;

use super::action::Action;
use crate::effect::Effect;

/// A dripper turns an action into a state change and an optional effect.
///
/// `drip` is the only place state transitions happen. It must not perform I/O
/// itself: anything asynchronous goes into the returned [`Effect`].
pub trait Dripper: Send + Sync + 'static {
    /// The state this dripper operates on.
    type State: Send + 'static;

    /// The action type this dripper handles.
    type Action: Action;

    /// Apply `action` to `state` and return the follow-up effect.
    fn drip(&self, state: &mut Self::State, action: &Self::Action) -> Effect<Self::Action>;
}

type DripFn<S, A> = dyn Fn(&mut S, &A) -> Effect<A> + Send + Sync;

/// Closure-backed dripper.
///
/// Also the type-erased wrapper every composition combinator produces, so
/// drippers of different concrete types can be stored side by side.
pub struct Drip<S, A> {
    drip: Arc<DripFn<S, A>>,
}

impl<S, A> Clone for Drip<S, A> {
    fn clone(&self) -> Self {
        Self {
            drip: Arc::clone(&self.drip),
        }
    }
}

impl<S: Send + 'static, A: Action> Drip<S, A> {
    /// Dripper that mutates state in place.
    pub fn new<F>(drip: F) -> Self
    where
        F: Fn(&mut S, &A) -> Effect<A> + Send + Sync + 'static,
    {
        Self {
            drip: Arc::new(drip),
        }
    }

    /// Dripper that returns the next state instead of mutating.
    pub fn reducing<F>(reduce: F) -> Self
    where
        S: Clone,
        F: Fn(S, &A) -> (S, Effect<A>) + Send + Sync + 'static,
    {
        Self::new(move |state: &mut S, action: &A| {
            let (next, effect) = reduce(state.clone(), action);
            *state = next;
            effect
        })
    }

    /// Wrap any dripper into a `Drip`.
    pub fn erase<D>(dripper: D) -> Self
    where
        D: Dripper<State = S, Action = A>,
    {
        Self::new(move |state: &mut S, action: &A| dripper.drip(state, action))
    }

    /// Placeholder for a dripper whose behavior has not been declared.
    ///
    /// # Panics
    ///
    /// Panics as soon as it receives an action.
    pub fn unimplemented(name: &'static str) -> Self {
        Self::new(move |_: &mut S, _: &A| {
            panic!("dripper `{name}` declares no behavior: implement `drip` or build a body")
        })
    }

    /// Run `self`, then `other`, and keep both effects.
    pub fn combine(self, other: Self) -> Self {
        super::combine::combine([self, other])
    }
}

impl<S: Send + 'static, A: Action> Dripper for Drip<S, A> {
    type State = S;
    type Action = A;

    fn drip(&self, state: &mut S, action: &A) -> Effect<A> {
        (self.drip)(state, action)
    }
}
