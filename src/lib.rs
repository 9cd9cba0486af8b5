//! A single source of truth state container, similar to redux.
//!
//! A [Store] holds the current `State`, which is only replaced by
//! dispatching an `Action` through a [Reducer]. Subscribers are held
//! weakly, can narrow what they receive with a [Subscription]
//! pipeline, and are deduplicated by identity.

mod listener;
pub mod middleware;
mod reducer;
mod registry;
mod store;
mod subscription;

pub use listener::*;
pub use reducer::*;
pub use store::{Store, StoreRef};
pub use subscription::Subscription;
