//! [Middleware] used to modify the behaviour of a [Store] during a
//! [Store::dispatch()]. This module also contains a simple logging
//! middleware which can be used as a utility in an application.

pub mod simple_logger;

use crate::Store;
use std::rc::Rc;

/// Executes subsequent middleware and then runs the
/// [Reducer](crate::Reducer), returning the new state, or `None` if
/// the action was swallowed along the way.
pub type ReduceFn<'a, State, Action> =
    dyn Fn(&Store<State, Action>, Option<&Action>) -> Option<Rc<State>> + 'a;

/// `Middleware` used to modify the behaviour of a [Store] during a
/// [Store::dispatch()].
pub trait Middleware<State, Action> {
    /// This method is invoked by the [Store] during a
    /// [Store::dispatch()] just before the `Action` is sent to the
    /// [Reducer](crate::Reducer). It is necessary to call the
    /// provided `reduce` function, which executes subsequent
    /// middleware and runs the [Reducer](crate::Reducer), and usually
    /// the state it returns is returned from this method.
    ///
    /// This method allows modifying the action in question, or even
    /// removing it by passing `None`, preventing the
    /// [Reducer](crate::Reducer) from processing the action. A removed
    /// action changes nothing and notifies no subscribers.
    fn on_reduce(
        &self,
        store: &Store<State, Action>,
        action: Option<&Action>,
        reduce: &ReduceFn<'_, State, Action>,
    ) -> Option<Rc<State>> {
        reduce(store, action)
    }
}
