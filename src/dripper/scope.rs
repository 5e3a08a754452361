//! Pullback: lifting a local dripper into a larger state and action.

use super::action::Action;
use super::reducer::{Drip, Dripper};
use crate::effect::Effect;

/// Bidirectional path from a global state to one of its parts.
pub struct StateLens<G, L> {
    get: fn(&G) -> &L,
    get_mut: fn(&mut G) -> &mut L,
}

impl<G, L> Clone for StateLens<G, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, L> Copy for StateLens<G, L> {}

impl<G, L> StateLens<G, L> {
    pub const fn new(get: fn(&G) -> &L, get_mut: fn(&mut G) -> &mut L) -> Self {
        Self { get, get_mut }
    }

    pub fn get<'a>(&self, global: &'a G) -> &'a L {
        (self.get)(global)
    }

    pub fn get_mut<'a>(&self, global: &'a mut G) -> &'a mut L {
        (self.get_mut)(global)
    }
}

/// Partial projection from a global action onto a local action subset.
///
/// `extract` answers `None` for actions that do not belong to the local
/// subset; `embed` wraps a local action emitted by an effect back up.
pub struct ActionLens<G, L> {
    extract: fn(&G) -> Option<&L>,
    embed: fn(L) -> G,
}

impl<G, L> Clone for ActionLens<G, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, L> Copy for ActionLens<G, L> {}

impl<G, L> ActionLens<G, L> {
    pub const fn new(extract: fn(&G) -> Option<&L>, embed: fn(L) -> G) -> Self {
        Self { extract, embed }
    }

    pub fn extract<'a>(&self, global: &'a G) -> Option<&'a L> {
        (self.extract)(global)
    }

    pub fn embed(&self, local: L) -> G {
        (self.embed)(local)
    }
}

/// A local dripper running inside a global state and action.
///
/// Actions outside the local subset leave the global state untouched and
/// produce no effect.
pub struct Scope<D: Dripper, G, GA> {
    state: StateLens<G, D::State>,
    action: ActionLens<GA, D::Action>,
    local: D,
}

impl<D, G, GA> Scope<D, G, GA>
where
    D: Dripper,
    G: Send + 'static,
    GA: Action,
{
    pub fn new(state: StateLens<G, D::State>, action: ActionLens<GA, D::Action>, local: D) -> Self {
        Self {
            state,
            action,
            local,
        }
    }
}

impl<D, G, GA> Dripper for Scope<D, G, GA>
where
    D: Dripper,
    G: Send + 'static,
    GA: Action,
{
    type State = G;
    type Action = GA;

    fn drip(&self, state: &mut G, action: &GA) -> Effect<GA> {
        let Some(local_action) = self.action.extract(action) else {
            return Effect::none();
        };
        let effect = self.local.drip(self.state.get_mut(state), local_action);
        effect.map(self.action.embed)
    }
}

/// Lift `local` so that it runs inside `G` / `GA`.
pub fn pullback<D, G, GA>(
    local: D,
    state: StateLens<G, D::State>,
    action: ActionLens<GA, D::Action>,
) -> Drip<G, GA>
where
    D: Dripper,
    G: Send + 'static,
    GA: Action,
{
    Drip::erase(Scope::new(state, action, local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Cancellation, Pour};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Counter {
        count: i32,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct App {
        counter: Counter,
        title: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum CounterAction {
        Increment,
        Echo,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum AppAction {
        Counter(CounterAction),
        Rename(String),
    }

    impl Action for CounterAction {}
    impl Action for AppAction {}

    const COUNTER_STATE: StateLens<App, Counter> =
        StateLens::new(|app| &app.counter, |app| &mut app.counter);

    const COUNTER_ACTION: ActionLens<AppAction, CounterAction> = ActionLens::new(
        |action| match action {
            AppAction::Counter(local) => Some(local),
            _ => None,
        },
        AppAction::Counter,
    );

    fn counter() -> Drip<Counter, CounterAction> {
        Drip::new(|state: &mut Counter, action: &CounterAction| match action {
            CounterAction::Increment => {
                state.count += 1;
                Effect::none()
            }
            CounterAction::Echo => Effect::send(CounterAction::Increment),
        })
    }

    #[test]
    fn matching_action_mutates_slice() {
        let app_dripper = pullback(counter(), COUNTER_STATE, COUNTER_ACTION);
        let mut app = App::default();
        let effect = app_dripper.drip(&mut app, &AppAction::Counter(CounterAction::Increment));
        assert_eq!(app.counter.count, 1);
        assert!(effect.is_none());
    }

    #[test]
    fn non_matching_action_is_noop() {
        let app_dripper = pullback(counter(), COUNTER_STATE, COUNTER_ACTION);
        let mut app = App {
            counter: Counter { count: 7 },
            title: "before".to_string(),
        };
        let before = app.clone();

        let effect = app_dripper.drip(&mut app, &AppAction::Rename("after".to_string()));

        assert_eq!(app, before);
        assert!(effect.is_none());
    }

    #[tokio::test]
    async fn local_effect_actions_are_embedded() {
        let app_dripper = pullback(counter(), COUNTER_STATE, COUNTER_ACTION);
        let mut app = App::default();
        let effect = app_dripper.drip(&mut app, &AppAction::Counter(CounterAction::Echo));
        assert_eq!(effect.run_count(), 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let pour = {
            let seen = Arc::clone(&seen);
            Pour::new(move |action: AppAction| seen.lock().push(action), Cancellation::new())
        };
        effect.execute(pour).await;

        assert_eq!(
            *seen.lock(),
            vec![AppAction::Counter(CounterAction::Increment)]
        );
    }

    #[test]
    fn lenses_read_and_write_the_same_slice() {
        let mut app = App::default();
        COUNTER_STATE.get_mut(&mut app).count = 42;
        assert_eq!(COUNTER_STATE.get(&app).count, 42);

        let wrapped = COUNTER_ACTION.embed(CounterAction::Echo);
        assert_eq!(COUNTER_ACTION.extract(&wrapped), Some(&CounterAction::Echo));
        assert_eq!(COUNTER_ACTION.extract(&AppAction::Rename(String::new())), None);
    }
}
