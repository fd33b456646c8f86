//! Awaiting the outcome of a stream.
//!
//! [`collect_into_future`](crate::producer::ProducerExt::collect_into_future)
//! starts the stream right away and returns a future of everything it
//! emitted:
//!
//! - **Completed**: resolves with `Ok(values)` in delivery order
//! - **Failed**: resolves with `Err(FlattenError::Failed(err))`, values
//!   emitted before the failure are dropped
//! - **Interrupted**: resolves with `Err(FlattenError::Interrupted)`
//!
//! Dropping the future before it resolves cancels the stream.

use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::channel::oneshot;

use crate::{
  error::FlattenError,
  event::Terminal,
  observer::Observer,
  subscription::{Subscription, SubscriptionGuard},
};

type Outcome<Item, Err> = Result<Vec<Item>, FlattenError<Err>>;

/// Buffers values until the stream terminates, then sends the outcome.
pub struct CollectObserver<Item, Err> {
  values: Vec<Item>,
  tx: oneshot::Sender<Outcome<Item, Err>>,
}

impl<Item, Err> CollectObserver<Item, Err> {
  pub(crate) fn new() -> (Self, oneshot::Receiver<Outcome<Item, Err>>) {
    let (tx, rx) = oneshot::channel();
    (Self { values: vec![], tx }, rx)
  }
}

impl<Item, Err> Observer<Item, Err> for CollectObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.values.push(value) }

  fn terminate(self, terminal: Terminal<Err>) {
    let outcome = match terminal {
      Terminal::Completed => Ok(self.values),
      Terminal::Failed(err) => Err(FlattenError::Failed(err)),
      Terminal::Interrupted => Err(FlattenError::Interrupted),
    };
    // The future was dropped, nobody is waiting.
    let _ = self.tx.send(outcome);
  }

  fn is_closed(&self) -> bool { self.tx.is_canceled() }
}

/// Future returned by
/// [`collect_into_future`](crate::producer::ProducerExt::collect_into_future).
#[must_use = "futures do nothing unless polled, and dropping this one cancels the stream"]
pub struct CollectFuture<Item, Err, U: Subscription> {
  rx: oneshot::Receiver<Outcome<Item, Err>>,
  _guard: SubscriptionGuard<U>,
}

impl<Item, Err, U: Subscription> CollectFuture<Item, Err, U> {
  pub(crate) fn new(rx: oneshot::Receiver<Outcome<Item, Err>>, guard: SubscriptionGuard<U>) -> Self {
    Self { rx, _guard: guard }
  }
}

// No field is pinned structurally, the receiver is polled through `Pin::new`.
impl<Item, Err, U: Subscription> Unpin for CollectFuture<Item, Err, U> {}

impl<Item, Err, U: Subscription> Future for CollectFuture<Item, Err, U> {
  type Output = Outcome<Item, Err>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    match Pin::new(&mut self.rx).poll(cx) {
      Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
      // The observer was dropped without a terminal event.
      Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(FlattenError::Interrupted)),
      Poll::Pending => Poll::Pending,
    }
  }
}

#[cfg(test)]
mod test {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  };

  use futures::executor::block_on;

  use crate::prelude::*;

  #[test]
  fn completed() {
    assert_eq!(block_on(from_iter::<_, ()>(0..4).collect_into_future()), Ok(vec![0, 1, 2, 3]));
    assert_eq!(empty::<i32, ()>().wait(), Ok(vec![]));
  }

  #[test]
  fn failed() {
    assert_eq!(throw::<i32, _>("boom").wait(), Err(FlattenError::Failed("boom")));
  }

  #[test]
  fn interrupted_by_the_source() {
    let values = create(|emitter: Emitter<i32, ()>| {
      drop(emitter);
    })
    .wait();
    assert_eq!(values, Err(FlattenError::Interrupted));
  }

  #[test]
  fn dropping_the_future_cancels() {
    let cancelled = Arc::new(AtomicBool::new(false));
    let c_cancelled = cancelled.clone();
    let future = create(move |_: Emitter<i32, ()>| {
      ClosureSubscription(move || c_cancelled.store(true, Ordering::SeqCst))
    })
    .collect_into_future();

    assert!(!cancelled.load(Ordering::SeqCst));
    drop(future);
    assert!(cancelled.load(Ordering::SeqCst));
  }
}
