//! Parallel composition of drippers over shared state.

use super::action::Action;
use super::reducer::{Drip, Dripper};
use crate::effect::Effect;

/// Combine drippers into one.
///
/// Every dripper sees the same state and action exactly once per dispatch, in
/// the order given here. All resulting effects are merged, none is dropped.
pub fn combine<S, A, I>(drippers: I) -> Drip<S, A>
where
    S: Send + 'static,
    A: Action,
    I: IntoIterator<Item = Drip<S, A>>,
{
    let drippers: Vec<Drip<S, A>> = drippers.into_iter().collect();
    Drip::new(move |state: &mut S, action: &A| {
        Effect::merge_all(drippers.iter().map(|dripper| dripper.drip(state, action)))
    })
}

/// Combine drippers of different concrete types.
///
/// ```
/// use dripper::{combine, Action, Drip, Effect};
///
/// #[derive(Debug)]
/// struct Tick;
/// impl Action for Tick {}
///
/// let count = Drip::new(|state: &mut (u32, u32), _: &Tick| {
///     state.0 += 1;
///     Effect::none()
/// });
/// let other = Drip::new(|state: &mut (u32, u32), _: &Tick| {
///     state.1 += 2;
///     Effect::none()
/// });
/// let both = combine!(count, other);
/// ```
#[macro_export]
macro_rules! combine {
    ($($dripper:expr),+ $(,)?) => {
        $crate::combine([$($crate::Drip::erase($dripper)),+])
    };
}
