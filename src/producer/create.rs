use std::marker::PhantomData;

use crate::{
  event::Terminal,
  observer::{BoxedObserver, Liveness, Observer},
  producer::Producer,
  subscription::Subscription,
};

/// Producer created from a function.
///
/// Created by [`create`].
#[derive(Clone)]
pub struct Create<F, Item, Err> {
  f: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

/// Build a producer from a function that receives an owned [`Emitter`] and
/// returns the teardown of the work it started.
///
/// The emitter is `Send`, so the function may hand it to another thread and
/// return immediately:
///
/// ```rust
/// use rxflatten::prelude::*;
///
/// let producer = create(|mut emitter: Emitter<i32, ()>| {
///   let worker = std::thread::spawn(move || {
///     emitter.next(42);
///     emitter.complete();
///   });
///   ClosureSubscription(move || drop(worker))
/// });
/// assert_eq!(producer.wait(), Ok(vec![42]));
/// ```
pub fn create<F, U, Item, Err>(f: F) -> Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + Send + 'static,
{
  Create { f, _marker: PhantomData }
}

/// Owned handle a [`create`] function emits through.
///
/// Once the subscription of its stream is released, everything emitted is
/// dropped silently.
pub struct Emitter<Item, Err> {
  observer: Option<BoxedObserver<Item, Err>>,
  alive: Liveness,
}

impl<Item, Err> Emitter<Item, Err> {
  pub fn next(&mut self, value: Item) {
    if !self.alive.is_alive() {
      return;
    }
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
    }
  }

  pub fn error(self, err: Err) { self.terminate(Terminal::Failed(err)) }

  pub fn complete(self) { self.terminate(Terminal::Completed) }

  /// `true` once the stream was cancelled or the downstream stopped
  /// listening. Long running work can poll this to stop early.
  pub fn is_closed(&self) -> bool {
    !self.alive.is_alive() || self.observer.as_ref().is_none_or(|o| o.is_closed())
  }

  fn terminate(mut self, terminal: Terminal<Err>) {
    if let Some(observer) = self.observer.take() {
      if self.alive.is_alive() {
        self.alive.kill();
        observer.terminate(terminal);
      }
    }
  }
}

/// Subscription of a [`create`] producer.
pub struct CreateSubscription<U> {
  alive: Liveness,
  teardown: U,
}

impl<U: Subscription> Subscription for CreateSubscription<U> {
  fn unsubscribe(self) {
    self.alive.kill();
    self.teardown.unsubscribe();
  }

  fn is_closed(&self) -> bool { !self.alive.is_alive() }
}

impl<F, U, Item, Err> Producer<Item, Err> for Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = CreateSubscription<U>;

  fn start<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let alive = Liveness::default();
    let emitter = Emitter { observer: Some(Box::new(observer)), alive: alive.clone() };
    let teardown = (self.f)(emitter);
    CreateSubscription { alive, teardown }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  };

  use parking_lot::Mutex;

  use super::*;
  use crate::{observer::observer_fn, subscription::ClosureSubscription};

  #[test]
  fn next_complete() {
    let emitted = Arc::new(Mutex::new(vec![]));
    let c_emitted = emitted.clone();
    let completed = Arc::new(AtomicBool::new(false));
    let c_completed = completed.clone();

    create(|mut emitter: Emitter<i32, ()>| {
      emitter.next(1);
      emitter.next(2);
      emitter.complete();
    })
    .start(observer_fn(
      move |v| c_emitted.lock().push(v),
      move |t: Terminal<()>| c_completed.store(t.is_completed(), Ordering::SeqCst),
    ));

    assert_eq!(*emitted.lock(), vec![1, 2]);
    assert!(completed.load(Ordering::SeqCst));
  }

  #[test]
  fn error() {
    let error = Arc::new(Mutex::new(None));
    let c_error = error.clone();

    create(|emitter: Emitter<(), &'static str>| emitter.error("oops")).start(observer_fn(
      |_: ()| {},
      move |t: Terminal<&'static str>| {
        if let Terminal::Failed(e) = t {
          *c_error.lock() = Some(e);
        }
      },
    ));

    assert_eq!(*error.lock(), Some("oops"));
  }

  #[test]
  fn teardown_and_late_emission() {
    let emitted = Arc::new(Mutex::new(vec![]));
    let c_emitted = emitted.clone();
    let torn_down = Arc::new(AtomicBool::new(false));
    let c_torn_down = torn_down.clone();
    let slot = Arc::new(Mutex::new(None));
    let c_slot = slot.clone();

    let subscription = create(move |mut emitter: Emitter<i32, ()>| {
      emitter.next(1);
      *c_slot.lock() = Some(emitter);
      ClosureSubscription(move || c_torn_down.store(true, Ordering::SeqCst))
    })
    .start(observer_fn(move |v| c_emitted.lock().push(v), |_: Terminal<()>| {}));

    assert!(!subscription.is_closed());
    subscription.unsubscribe();
    assert!(torn_down.load(Ordering::SeqCst));

    let mut emitter = slot.lock().take().unwrap();
    assert!(emitter.is_closed());
    emitter.next(2);
    assert_eq!(*emitted.lock(), vec![1]);
  }
}
