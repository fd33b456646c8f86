//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Events
pub use crate::event::{Event, Terminal};
// Observer trait and adapters
pub use crate::observer::{observer_fn, AllObserver, BoxedObserver, FnMutObserver, Observer};
// Flatten
pub use crate::ops::{FlattenOp, FlattenStats, FlattenSubscription};
// Producers
pub use crate::producer::{
  create, empty, from_iter, never, of, start_on, throw, BoxedProducer, Emitter, Of, Producer,
  ProducerExt,
};
// Schedulers
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::scheduler::{
  ImmediateScheduler, NewThreadScheduler, Scheduler, TaskHandle, TestScheduler,
};
pub use crate::strategy::FlattenStrategy;
// Subscription
pub use crate::subscription::{
  BoxedSubscription, ClosureSubscription, CompositeSubscription, IntoBoxedSubscription,
  SharedSubscription, Subscription, SubscriptionExt, SubscriptionGuard, TupleSubscription,
};
pub use crate::error::{ErrorOrigin, FlattenError};
