use crate::{
    middleware::{Middleware, ReduceFn},
    registry::Registry,
    AsListener, AsSubscriberId, Reducer, Subscription,
};
use std::{
    cell::{Cell, RefCell},
    ops::Deref,
    rc::Rc,
};

/// A wrapper for an [Rc] reference to a [Store].
///
/// This wrapper exists to provide a standard interface for re-useable
/// middleware and subscribers which may require a long living
/// reference to the store in order to dispatch actions from inside
/// their notification callbacks. The store only holds its
/// subscribers weakly, so a subscriber owning a `StoreRef` does not
/// create a reference cycle.
pub struct StoreRef<State, Action>(Rc<Store<State, Action>>);

impl<State, Action> Clone for StoreRef<State, Action> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<State, Action> StoreRef<State, Action>
where
    State: 'static,
    Action: 'static,
{
    pub fn new<R: Reducer<State, Action> + 'static>(reducer: R, initial_state: State) -> Self {
        Self(Rc::new(Store::new(reducer, initial_state)))
    }
}

impl<State, Action> Deref for StoreRef<State, Action> {
    type Target = Store<State, Action>;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<State, Action> PartialEq for StoreRef<State, Action> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Marks the [Store] as dispatching for as long as it is alive,
/// including while a panic from the [Reducer] unwinds.
struct DispatchGuard<'a>(&'a Cell<usize>);

impl<'a> DispatchGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        DispatchGuard(depth)
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// This struct is designed to operate as a central source of truth
/// and global "immutable" state within your application.
///
/// The current state of this store ([Store::state()]) can only be
/// modified by dispatching an `Action` via [Store::dispatch()] to the
/// store. These actions are taken by a [Reducer] which you provided
/// to the store (at construction) and a new current state is
/// produced. The previous state is never mutated.
///
/// Subscribers are notified of every new state with
/// [Store::subscribe()], or of a derived and optionally filtered
/// substate with [Store::subscribe_with()]. The store holds its
/// subscribers weakly: dropping the last strong reference to a
/// subscriber ends its subscription, no
/// [unsubscribe()](Store::unsubscribe()) required.
///
/// Subscribers are notified in the order they subscribed.
/// Subscribers may dispatch, subscribe and unsubscribe from inside
/// their callbacks. A dispatch from inside a callback runs to
/// completion, notifying everyone of its own state, before the outer
/// notification pass resumes with the outer state.
pub struct Store<State, Action> {
    /// The [Reducer] for this store, which takes `Actions` and
    /// produces the next `State`.
    reducer: Box<dyn Reducer<State, Action>>,
    /// The current state of this store.
    state: RefCell<Rc<State>>,
    /// The subscriptions which are notified of changes to the state
    /// of this store.
    subscriptions: Registry<State>,
    /// Middleware which modifies the functionality of this store.
    middleware: RefCell<Vec<Rc<dyn Middleware<State, Action>>>>,
    /// How many dispatches are currently on the stack.
    dispatch_depth: Cell<usize>,
}

impl<State, Action> Store<State, Action>
where
    State: 'static,
    Action: 'static,
{
    /// Create a new [Store], which uses the specified `reducer` to
    /// handle `Action`s which produce new states, starting with the
    /// `initial_state`.
    pub fn new<R: Reducer<State, Action> + 'static>(reducer: R, initial_state: State) -> Self {
        Self {
            reducer: Box::new(reducer),
            state: RefCell::new(Rc::new(initial_state)),
            subscriptions: Registry::new(),
            middleware: RefCell::new(Vec::new()),
            dispatch_depth: Cell::new(0),
        }
    }

    /// Get the current `State` stored in this store.
    ///
    /// Modifications to this state need to be performed by
    /// dispatching an `Action` to the store using
    /// [dispatch()](Store::dispatch()).
    pub fn state(&self) -> Rc<State> {
        self.state.borrow().clone()
    }

    /// `true` while a [dispatch()](Store::dispatch()) is running,
    /// including while subscribers are being notified.
    pub fn is_dispatching(&self) -> bool {
        self.dispatch_depth.get() > 0
    }

    /// The number of subscriptions currently registered. Subscriptions
    /// whose subscriber was dropped are counted until the next
    /// notification or [purge_dead_subscribers()](Store::purge_dead_subscribers()).
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Remove every subscription whose subscriber has been dropped,
    /// returning how many were removed. This happens automatically
    /// on every dispatch, use this to release them sooner.
    pub fn purge_dead_subscribers(&self) -> usize {
        self.subscriptions.purge_dead()
    }

    /// Dispatch an `Action` to the reducer on this `Store` without
    /// invoking middleware.
    fn dispatch_reducer(&self, action: &Action) -> Rc<State> {
        let state = self.reducer.reduce(&self.state(), action);
        *self.state.borrow_mut() = state.clone();
        state
    }

    /// A recursive function which executes each middleware for this
    /// store starting at `index`, until all middleware has been
    /// invoked, at which point the `Action` is sent to the reducer.
    fn middleware_reduce_next(&self, index: usize, action: Option<&Action>) -> Option<Rc<State>> {
        let middleware = self.middleware.borrow().get(index).cloned();

        match middleware {
            Some(middleware) => {
                let next: &ReduceFn<'_, State, Action> =
                    &move |store: &Self, action: Option<&Action>| {
                        store.middleware_reduce_next(index + 1, action)
                    };
                middleware.on_reduce(self, action, next)
            }
            None => action.map(|action| self.dispatch_reducer(action)),
        }
    }

    /// Dispatch an `Action` to be passed to the [Reducer] in order to
    /// produce a new `State`, and then notify the subscribers.
    ///
    /// # Panics
    ///
    /// A panic in the [Reducer] propagates out of this method, the
    /// store keeps its previous state and no subscriber is notified.
    pub fn dispatch<A: Into<Action>>(&self, action: A) {
        self.dispatch_impl(action.into());
    }

    /// Concrete version of [Store::dispatch()], for code size
    /// reduction purposes, to avoid generating multiple versions of
    /// this function per action that implements `Into<Action>`.
    fn dispatch_impl(&self, action: Action) {
        let _guard = DispatchGuard::enter(&self.dispatch_depth);
        log::trace!("dispatch (depth {})", self.dispatch_depth.get());

        let state = if self.middleware.borrow().is_empty() {
            Some(self.dispatch_reducer(&action))
        } else {
            self.middleware_reduce_next(0, Some(&action))
        };

        // Each pass notifies with the state its own dispatch produced,
        // even if a subscriber dispatches again during the pass.
        match state {
            Some(state) => self.subscriptions.notify_all(&state),
            None => log::trace!("action swallowed by middleware"),
        }
    }

    /// Subscribe to changes in the store state. The subscriber is
    /// notified of the current state immediately, and then of every
    /// new state produced by [dispatch()](Store::dispatch()).
    ///
    /// The subscriber is a weak reference; when the strong reference
    /// associated with it (usually a [Callback](crate::Callback) or
    /// an [Rc]) is dropped, the subscription will be removed from this
    /// store upon the next [dispatch()](Store::dispatch()).
    ///
    /// Subscribing a subscriber which is already subscribed replaces
    /// its subscription, it is never notified twice for one state.
    pub fn subscribe<L: AsListener<Rc<State>>>(&self, listener: L) {
        self.subscribe_with(listener, |subscription| subscription)
    }

    /// Subscribe to a substate of the store state. `transform`
    /// receives the identity [Subscription] and returns the pipeline
    /// that produces the values the subscriber wants, for example:
    ///
    /// ```
    /// use reactive_store::{Callback, Store};
    /// use std::rc::Rc;
    ///
    /// let store = Store::new(|state: &Rc<i32>, action: &i32| Rc::new(**state + *action), 0);
    /// let callback = Callback::new(|is_even: bool| println!("even: {}", is_even));
    ///
    /// store.subscribe_with(&callback, |subscription| {
    ///     subscription
    ///         .select(|state: &Rc<i32>| **state % 2 == 0)
    ///         .skip_repeats_eq()
    /// });
    /// store.dispatch(2);
    /// ```
    ///
    /// Like [subscribe()](Store::subscribe()), the subscriber is
    /// immediately sent the current state (if the pipeline emits it),
    /// and any existing subscription of the same subscriber is
    /// replaced.
    ///
    /// # Panics
    ///
    /// The pipeline steps (`select`, `filter`, `skip_repeats`) must be
    /// pure. A step which dispatches to this store panics, because its
    /// own pipeline is already running when the nested dispatch tries to
    /// run it again.
    pub fn subscribe_with<T, L, F>(&self, listener: L, transform: F)
    where
        T: 'static,
        L: AsListener<T>,
        F: FnOnce(Subscription<State, Rc<State>>) -> Subscription<State, T>,
    {
        let subscription = transform(Subscription::new());
        let subscription_box = self.subscriptions.add(subscription, listener.as_listener());
        self.subscriptions.notify_one(&subscription_box, &self.state());
    }

    /// Remove the subscription of `subscriber`. Does nothing if it is
    /// not subscribed. Safe to call from inside a notification
    /// callback: the subscriber is not notified again, even for the
    /// pass currently in progress.
    pub fn unsubscribe<S: AsSubscriberId>(&self, subscriber: S) {
        self.subscriptions.remove(subscriber.subscriber_id());
    }

    /// Add [Middleware] to modify the behaviour of this [Store]
    /// during a [dispatch()][Store::dispatch()]. Middleware runs in
    /// the order it was added.
    pub fn add_middleware<M: Middleware<State, Action> + 'static>(&self, middleware: M) {
        self.middleware.borrow_mut().push(Rc::new(middleware));
    }
}
