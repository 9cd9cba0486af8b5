use std::rc::Rc;

/// A pipeline which narrows the full `State` of a
/// [Store](crate::Store) down to the value a subscriber is interested
/// in.
///
/// Every [Store::dispatch()](crate::Store::dispatch()) runs the
/// pipeline of each subscription with the newly reduced state. The
/// steps run left to right, and as soon as one step suppresses the
/// value, the subscriber is not notified for that state.
///
/// ```
/// use reactive_store::Subscription;
/// use std::rc::Rc;
///
/// struct AppState {
///     counter: i32,
///     title: String,
/// }
///
/// let mut subscription = Subscription::<AppState, _>::new()
///     .select(|state: &Rc<AppState>| state.counter)
///     .skip_repeats_eq();
///
/// let state = Rc::new(AppState { counter: 1, title: "a".into() });
/// assert_eq!(Some(1), subscription.apply(&state));
///
/// let state = Rc::new(AppState { counter: 1, title: "b".into() });
/// assert_eq!(None, subscription.apply(&state));
/// ```
pub struct Subscription<State, T> {
    apply: Box<dyn FnMut(&Rc<State>) -> Option<T>>,
}

impl<State> Subscription<State, Rc<State>>
where
    State: 'static,
{
    /// Create the identity pipeline, which emits the full state on
    /// every notification.
    pub fn new() -> Self {
        Self {
            apply: Box::new(|state: &Rc<State>| Some(state.clone())),
        }
    }
}

impl<State> Default for Subscription<State, Rc<State>>
where
    State: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<State, T> Subscription<State, T>
where
    State: 'static,
    T: 'static,
{
    /// Run this pipeline against `state`, returning the value to be
    /// sent to the subscriber, or `None` if the notification is
    /// suppressed.
    pub fn apply(&mut self, state: &Rc<State>) -> Option<T> {
        (self.apply)(state)
    }

    /// Map the value emitted so far to a substate. Always emits.
    pub fn select<U, F>(mut self, selector: F) -> Subscription<State, U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static,
    {
        Subscription {
            apply: Box::new(move |state: &Rc<State>| (self.apply)(state).map(|value| selector(&value))),
        }
    }

    /// Only emit values accepted by `predicate`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        Subscription {
            apply: Box::new(move |state: &Rc<State>| (self.apply)(state).filter(|value| predicate(value))),
        }
    }

    /// Suppress a value when `is_repeat(last_emitted, candidate)`
    /// returns `true`. The first value reaching this step is always
    /// emitted.
    ///
    /// Only the last value emitted by this step is remembered.
    pub fn skip_repeats<F>(mut self, is_repeat: F) -> Self
    where
        T: Clone,
        F: Fn(&T, &T) -> bool + 'static,
    {
        let mut last: Option<T> = None;

        Subscription {
            apply: Box::new(move |state: &Rc<State>| {
                let candidate = (self.apply)(state)?;

                if let Some(last) = &last {
                    if is_repeat(last, &candidate) {
                        return None;
                    }
                }

                last = Some(candidate.clone());
                Some(candidate)
            }),
        }
    }

    /// [Subscription::skip_repeats()] using `PartialEq` to detect
    /// repeated values.
    pub fn skip_repeats_eq(self) -> Self
    where
        T: Clone + PartialEq,
    {
        self.skip_repeats(|last, candidate| last == candidate)
    }
}
