use crate::{Listener, SubscriberId, Subscription};
use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    rc::Rc,
};

/// What happened when a [SubscriptionBox] was notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The pipeline emitted and the subscriber was called.
    Delivered,
    /// The pipeline suppressed the value.
    Suppressed,
    /// The subscriber has been dropped by all of its owners.
    Dead,
}

/// The part of a [SubscriptionBox] which knows the type selected by
/// its pipeline.
trait TypedSubscription<State> {
    fn notify(&self, state: &Rc<State>) -> Delivery;
    fn is_alive(&self) -> bool;
}

struct Typed<State, T> {
    subscription: RefCell<Subscription<State, T>>,
    listener: Listener<T>,
}

impl<State, T> TypedSubscription<State> for Typed<State, T>
where
    State: 'static,
    T: 'static,
{
    fn notify(&self, state: &Rc<State>) -> Delivery {
        let subscriber = match self.listener.upgrade() {
            Some(subscriber) => subscriber,
            None => return Delivery::Dead,
        };

        // The pipeline borrow must end before the subscriber runs, it
        // may dispatch and re-enter this box.
        let value = self.subscription.borrow_mut().apply(state);

        match value {
            Some(value) => {
                subscriber.new_state(value);
                Delivery::Delivered
            }
            None => Delivery::Suppressed,
        }
    }

    fn is_alive(&self) -> bool {
        self.listener.is_alive()
    }
}

/// Binds one subscriber (weakly) to the pipeline it subscribed with.
///
/// The box is owned only by the [Registry]. Once it has been removed
/// from the registry it is inactive, and is never notified again,
/// even by a notification pass which started before the removal.
pub(crate) struct SubscriptionBox<State> {
    id: SubscriberId,
    active: Cell<bool>,
    typed: Box<dyn TypedSubscription<State>>,
}

impl<State> SubscriptionBox<State>
where
    State: 'static,
{
    pub fn new<T: 'static>(subscription: Subscription<State, T>, listener: Listener<T>) -> Self {
        Self {
            id: listener.id(),
            active: Cell::new(true),
            typed: Box::new(Typed {
                subscription: RefCell::new(subscription),
                listener,
            }),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// `true` if this box is bound to the living subscriber `id`.
    pub fn is_identity_subscriber(&self, id: SubscriberId) -> bool {
        self.id == id && self.typed.is_alive()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    fn deactivate(&self) {
        self.active.set(false);
    }

    /// Run the pipeline against `state`, and forward the result to the
    /// subscriber if it emits. A [Delivery::Dead] result is left to
    /// the [Registry] to clean up.
    pub fn notify(&self, state: &Rc<State>) -> Delivery {
        self.typed.notify(state)
    }
}

impl<State> Debug for SubscriptionBox<State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionBox")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

/// Removes the boxes found dead during a notification pass when the
/// pass ends, including while a panic from a subscriber unwinds.
struct PassCleanup<'a, State: 'static> {
    registry: &'a Registry<State>,
    dead: usize,
}

impl<State: 'static> Drop for PassCleanup<'_, State> {
    fn drop(&mut self) {
        if self.dead > 0 {
            self.registry.remove_inactive();
        }
    }
}

/// The ordered collection of [SubscriptionBox]es belonging to a
/// [Store](crate::Store). Insertion order is notification order.
///
/// The registry is never borrowed while a subscriber runs, so
/// subscribers are free to subscribe, unsubscribe and dispatch from
/// inside their callbacks.
pub(crate) struct Registry<State> {
    boxes: RefCell<Vec<Rc<SubscriptionBox<State>>>>,
}

impl<State> Registry<State>
where
    State: 'static,
{
    pub fn new() -> Self {
        Self {
            boxes: RefCell::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.borrow().len()
    }

    /// Add a new subscription to the end of the registry, replacing any
    /// existing subscription for the same subscriber. Returns the new
    /// box so that it can be sent its initial state.
    pub fn add<T: 'static>(
        &self,
        subscription: Subscription<State, T>,
        listener: Listener<T>,
    ) -> Rc<SubscriptionBox<State>> {
        let id = listener.id();
        if self.remove(id) {
            log::debug!("replacing subscription for subscriber {:?}", id);
        }

        let subscription_box = Rc::new(SubscriptionBox::new(subscription, listener));
        self.boxes.borrow_mut().push(subscription_box.clone());
        subscription_box
    }

    /// Remove the subscription for the living subscriber `id`. Returns
    /// `false` if there was none.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let mut boxes = self.boxes.borrow_mut();
        match boxes.iter().position(|b| b.is_identity_subscriber(id)) {
            Some(index) => {
                boxes.remove(index).deactivate();
                true
            }
            None => false,
        }
    }

    /// Notify a single box, removing it if its subscriber is dead.
    pub fn notify_one(&self, subscription_box: &Rc<SubscriptionBox<State>>, state: &Rc<State>) {
        if subscription_box.notify(state) == Delivery::Dead {
            subscription_box.deactivate();
            self.remove_inactive();
        }
    }

    /// Notify every subscription present when the pass starts, in
    /// order, with `state`.
    ///
    /// Boxes removed during the pass (by an unsubscribe from a
    /// callback, or a replacing subscribe) are skipped. Boxes added
    /// during the pass are not part of it. Boxes whose subscriber is
    /// found dead are removed once the pass completes, or unwinds
    /// from a panicking subscriber.
    pub fn notify_all(&self, state: &Rc<State>) {
        let snapshot: Vec<Rc<SubscriptionBox<State>>> = self.boxes.borrow().clone();
        log::trace!("notifying {} subscriptions", snapshot.len());

        let mut cleanup = PassCleanup {
            registry: self,
            dead: 0,
        };
        for subscription_box in &snapshot {
            if !subscription_box.is_active() {
                continue;
            }

            if subscription_box.notify(state) == Delivery::Dead {
                log::trace!("subscriber {:?} was dropped", subscription_box.id());
                subscription_box.deactivate();
                cleanup.dead += 1;
            }
        }
    }

    /// Remove every box whose subscriber has been dropped. Returns the
    /// number of boxes removed.
    pub fn purge_dead(&self) -> usize {
        for subscription_box in self.boxes.borrow().iter() {
            if !subscription_box.typed.is_alive() {
                subscription_box.deactivate();
            }
        }

        self.remove_inactive()
    }

    fn remove_inactive(&self) -> usize {
        // Left for the next cleanup if the registry is already borrowed.
        let mut boxes = match self.boxes.try_borrow_mut() {
            Ok(boxes) => boxes,
            Err(_) => return 0,
        };
        let before = boxes.len();
        boxes.retain(|b| b.is_active());
        let removed = before - boxes.len();

        if removed > 0 {
            log::debug!("removed {} dead subscription(s)", removed);
        }

        removed
    }

    #[cfg(test)]
    pub fn boxes(&self) -> Vec<Rc<SubscriptionBox<State>>> {
        self.boxes.borrow().clone()
    }
}
