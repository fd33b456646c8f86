//! # rxflatten: bounded-concurrency stream flattening
//!
//! Turn a stream of independently produced tasks into one stream of their
//! results, while capping how many of them run at the same time.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxflatten::prelude::*;
//!
//! let scheduler = ImmediateScheduler;
//! let mut sizes = from_iter(["a.png", "bb.png", "ccc.png"])
//!   .flat_map(FlattenStrategy::concurrent(2), move |name: &'static str| {
//!     start_on(scheduler, move || Ok::<_, ()>(name.len()))
//!   })
//!   .wait()
//!   .unwrap();
//! sizes.sort();
//! assert_eq!(sizes, vec![5, 6, 7]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Producer`] | Lazy stream, started with an observer |
//! | [`Observer`] | Receives values, then one terminal event |
//! | [`Subscription`] | Handle to cancel a running stream |
//! | [`FlattenStrategy`] | `Merge`, `Concat`, `Latest` or `Concurrent(n)` |
//! | [`Scheduler`] | Injected execution context for the actual work |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): [`ThreadPoolScheduler`] on top of
//!   `futures::executor::ThreadPool`
//! - **`tokio-scheduler`**: `TokioScheduler` on a tokio runtime's blocking
//!   pool
//!
//! [`Producer`]: producer::Producer
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`FlattenStrategy`]: strategy::FlattenStrategy
//! [`Scheduler`]: scheduler::Scheduler
//! [`ThreadPoolScheduler`]: scheduler::ThreadPoolScheduler

pub mod error;
pub mod event;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod producer;
pub mod scheduler;
pub mod strategy;
pub mod subscription;

pub use error::{ErrorOrigin, FlattenError, StrategyParseError};
// Re-export the prelude module
pub use prelude::*;

// Run the README snippets as doctests.
#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
