//! Producers: lazy descriptions of a stream.
//!
//! A [`Producer`] does nothing until [`start`](Producer::start) is called
//! with an observer. Starting consumes the description and returns a
//! subscription that cancels the running stream. Producers that are `Clone`
//! can be started many times; every start is independent.

use crate::{
  observer::Observer,
  ops::{
    flat_map::FlatMapSource,
    flatten::FlattenOp,
    into_future::{CollectFuture, CollectObserver},
    subscribe_on::SubscribeOnOp,
  },
  scheduler::Scheduler,
  strategy::FlattenStrategy,
  subscription::{Subscription, SubscriptionGuard},
  FlattenError,
};

mod boxed;
mod create;
mod of;
mod start_on;

pub use boxed::BoxedProducer;
pub use create::{create, Create, CreateSubscription, Emitter};
pub use of::{empty, from_iter, never, of, throw, Empty, FromIter, Never, Of, Throw};
pub use start_on::{start_on, StartOn, StartOnSubscription};

/// A lazy stream of `Item`s that may fail with `Err`.
pub trait Producer<Item, Err> {
  type Unsub: Subscription + Send + 'static;

  /// Start the stream, delivering its events to `observer`.
  fn start<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static;
}

/// Combinators available on every producer.
pub trait ProducerExt<Item, Err>: Producer<Item, Err> + Sized {
  /// Flatten a producer of producers into one stream under `strategy`.
  ///
  /// ```rust
  /// use rxflatten::prelude::*;
  ///
  /// let values = from_iter([of::<_, ()>(1), of(2), of(3)])
  ///   .flatten(FlattenStrategy::Concat)
  ///   .wait();
  /// assert_eq!(values, Ok(vec![1, 2, 3]));
  /// ```
  #[inline]
  fn flatten(self, strategy: FlattenStrategy) -> FlattenOp<Self, Item> { FlattenOp::new(self, strategy) }

  /// Turn every value into an inner producer with `f`, then flatten them
  /// under `strategy`.
  #[inline]
  fn flat_map<F, P>(self, strategy: FlattenStrategy, f: F) -> FlattenOp<FlatMapSource<Self, F, Item>, P>
  where
    F: FnMut(Item) -> P,
  {
    FlattenOp::new(FlatMapSource::new(self, f), strategy)
  }

  /// Start this producer from a task on `scheduler` instead of the caller's
  /// thread.
  #[inline]
  fn subscribe_on<S: Scheduler>(self, scheduler: S) -> SubscribeOnOp<Self, S> {
    SubscribeOnOp::new(self, scheduler)
  }

  /// Erase the concrete producer type.
  #[inline]
  fn box_it(self) -> BoxedProducer<Item, Err>
  where
    Self: Send + 'static,
    Item: 'static,
    Err: 'static,
  {
    BoxedProducer::new(self)
  }

  /// Start the stream and resolve with all of its values once it completes.
  ///
  /// Dropping the future before it resolves cancels the stream.
  fn collect_into_future(self) -> CollectFuture<Item, Err, Self::Unsub>
  where
    Item: Send + 'static,
    Err: Send + 'static,
  {
    let (observer, rx) = CollectObserver::new();
    let subscription = self.start(observer);
    CollectFuture::new(rx, SubscriptionGuard::new(subscription))
  }

  /// Block the calling thread until the stream terminates.
  ///
  /// The stream must make progress without the calling thread: a producer
  /// driven by a manually flushed scheduler never finishes here.
  fn wait(self) -> Result<Vec<Item>, FlattenError<Err>>
  where
    Item: Send + 'static,
    Err: Send + 'static,
  {
    futures::executor::block_on(self.collect_into_future())
  }
}

impl<T, Item, Err> ProducerExt<Item, Err> for T where T: Producer<Item, Err> {}
