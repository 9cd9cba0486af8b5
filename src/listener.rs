use std::{
    fmt::Debug,
    rc::{Rc, Weak},
};

/// Something which can be notified of new values produced by a
/// [Subscription](crate::Subscription) on a [Store](crate::Store).
///
/// `T` is the full `Rc<State>` for plain
/// [subscribe()](crate::Store::subscribe()) calls, or whatever type
/// the subscription's pipeline selects.
///
/// Any `Fn(T)` closure is a subscriber.
pub trait StoreSubscriber<T> {
    fn new_state(&self, state: T);
}

impl<T, F> StoreSubscriber<T> for F
where
    F: Fn(T),
{
    fn new_state(&self, state: T) {
        self(state)
    }
}

/// The reference identity of a subscriber.
///
/// Two subscribers are the same subscriber when they are the same
/// allocation, regardless of their behaviour or contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

impl SubscriberId {
    fn of<S: ?Sized>(subscriber: &Rc<S>) -> Self {
        SubscriberId(Rc::as_ptr(subscriber) as *const () as usize)
    }
}

/// A trait to take a subscriber (an [Rc] to a [StoreSubscriber], or a
/// [Callback]) and produce a [Listener], a weak reference to that
/// subscriber.
pub trait AsListener<T> {
    /// Produce a [Listener], a weak reference to this subscriber.
    fn as_listener(&self) -> Listener<T>;
}

/// A trait for anything that can name a subscriber, used by
/// [Store::unsubscribe()](crate::Store::unsubscribe()).
pub trait AsSubscriberId {
    fn subscriber_id(&self) -> SubscriberId;
}

/// A weak reference to a [StoreSubscriber]. This is what a
/// [Store](crate::Store) keeps for each subscription, so that it
/// never keeps a subscriber alive.
pub struct Listener<T> {
    subscriber: Weak<dyn StoreSubscriber<T>>,
    id: SubscriberId,
}

impl<T> Listener<T> {
    /// Attempt to upgrade the weak reference in this listener,
    /// returning `None` if the subscriber has been dropped.
    pub fn upgrade(&self) -> Option<Rc<dyn StoreSubscriber<T>>> {
        self.subscriber.upgrade()
    }

    /// Whether the subscriber is still owned by someone.
    pub fn is_alive(&self) -> bool {
        self.subscriber.strong_count() > 0
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Listener {
            subscriber: self.subscriber.clone(),
            id: self.id,
        }
    }
}

impl<T> Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<T> AsListener<T> for Listener<T> {
    fn as_listener(&self) -> Listener<T> {
        self.clone()
    }
}

impl<T, S> AsListener<T> for &Rc<S>
where
    S: StoreSubscriber<T> + 'static,
{
    fn as_listener(&self) -> Listener<T> {
        let subscriber: Weak<S> = Rc::downgrade(*self);
        Listener {
            subscriber,
            id: SubscriberId::of(*self),
        }
    }
}

impl<T> AsSubscriberId for Listener<T> {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }
}

impl<S: ?Sized> AsSubscriberId for &Rc<S> {
    fn subscriber_id(&self) -> SubscriberId {
        SubscriberId::of(*self)
    }
}

impl AsSubscriberId for SubscriberId {
    fn subscriber_id(&self) -> SubscriberId {
        *self
    }
}

/// A wrapper for a callback which is notified of changes to
/// [Store](crate::Store) `State` (or a substate of it).
///
/// The [Store](crate::Store) only holds a weak reference to the
/// callback. The subscription lasts as long as this `Callback` (or
/// one of its clones) is alive. Clones are the same subscriber.
pub struct Callback<T>(Rc<dyn StoreSubscriber<T>>);

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Callback(self.0.clone())
    }
}

impl<T> Callback<T> {
    pub fn new<C: Fn(T) + 'static>(closure: C) -> Self {
        Callback(Rc::new(closure))
    }

    pub fn emit(&self, state: T) {
        self.0.new_state(state)
    }
}

impl<C, T> From<C> for Callback<T>
where
    C: Fn(T) + 'static,
{
    fn from(closure: C) -> Self {
        Callback::new(closure)
    }
}

impl<T> AsListener<T> for &Callback<T> {
    fn as_listener(&self) -> Listener<T> {
        Listener {
            subscriber: Rc::downgrade(&self.0),
            id: SubscriberId::of(&self.0),
        }
    }
}

impl<T> AsSubscriberId for &Callback<T> {
    fn subscriber_id(&self) -> SubscriberId {
        SubscriberId::of(&self.0)
    }
}
