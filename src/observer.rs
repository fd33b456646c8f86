//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of a stream. It receives values via
//! `next` and exactly one terminal signal via `terminate`.

use std::convert::Infallible;

use futures::channel::mpsc::UnboundedSender;

use crate::event::{Event, Terminal};

mod pending;
mod serialized;
pub(crate) use pending::PendingObserver;
pub(crate) use serialized::{Liveness, SerializedObserver};

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: the consumer of a stream's events.
///
/// `terminate` consumes the observer, so a terminal signal can be delivered at
/// most once and nothing can be delivered after it.
pub trait Observer<Item, Err> {
  /// Receive the next value.
  fn next(&mut self, value: Item);

  /// Receive the terminal signal.
  fn terminate(self, terminal: Terminal<Err>);

  /// Checks if the observer no longer wants values.
  ///
  /// Synchronous sources (like `from_iter`) use this to stop early.
  fn is_closed(&self) -> bool { false }

  #[inline]
  fn error(self, err: Err)
  where
    Self: Sized,
  {
    self.terminate(Terminal::Failed(err))
  }

  #[inline]
  fn complete(self)
  where
    Self: Sized,
  {
    self.terminate(Terminal::Completed)
  }

  #[inline]
  fn interrupt(self)
  where
    Self: Sized,
  {
    self.terminate(Terminal::Interrupted)
  }
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (`Box<dyn Observer>`).
///
/// `Observer::terminate` takes `self` by value, which is not object-safe.
/// DynObserver mirrors the interface with `self: Box<Self>` instead.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_terminate(self: Box<Self>, terminal: Terminal<Err>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_terminate(self: Box<Self>, terminal: Terminal<Err>) { (*self).terminate(terminal); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// Boxed observer that can cross threads.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err> + Send>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn terminate(self, terminal: Terminal<Err>) { self.box_terminate(terminal) }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Closure adapter for infallible streams.
///
/// The closure becomes the `next` handler; the terminal signal is ignored.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn terminate(self, _: Terminal<Infallible>) {}
}

/// Observer built from a value handler and a terminal handler.
///
/// Created by [`observer_fn`].
pub struct AllObserver<N, T> {
  next: N,
  terminal: T,
}

/// Build an observer from two closures.
///
/// ```rust
/// use rxflatten::prelude::*;
///
/// let observer = observer_fn(
///   |v: i32| println!("value {v}"),
///   |t: Terminal<String>| println!("done: {}", t.as_label()),
/// );
/// of(1).start(observer);
/// ```
pub fn observer_fn<N, T>(next: N, terminal: T) -> AllObserver<N, T> { AllObserver { next, terminal } }

impl<N, T, Item, Err> Observer<Item, Err> for AllObserver<N, T>
where
  N: FnMut(Item),
  T: FnOnce(Terminal<Err>),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  #[inline]
  fn terminate(self, terminal: Terminal<Err>) { (self.terminal)(terminal) }
}

// ============================================================================
// Option and channel observers
// ============================================================================

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn terminate(self, terminal: Terminal<Err>) {
    if let Some(inner) = self {
      inner.terminate(terminal);
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Observer::is_closed) }
}

/// Forwards every event into a channel, so a stream running on other threads
/// can be consumed from one place.
impl<Item, Err> Observer<Item, Err> for UnboundedSender<Event<Item, Err>> {
  fn next(&mut self, value: Item) {
    // A dropped receiver means nobody listens anymore.
    let _ = self.unbounded_send(Event::Next(value));
  }

  fn terminate(self, terminal: Terminal<Err>) { let _ = self.unbounded_send(terminal.into()); }

  fn is_closed(&self) -> bool { UnboundedSender::is_closed(self) }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use futures::channel::mpsc::unbounded;

  use super::*;

  struct TestObserver {
    values: Vec<i32>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn terminate(self, _: Terminal<()>) {}
  }

  #[test]
  fn observer_trait() {
    let mut obs = TestObserver { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!obs.is_closed());
  }

  #[test]
  fn closure_as_observer() {
    let mut count = 0;
    let mut closure_obs = FnMutObserver(|v: i32| {
      count += v;
    });

    closure_obs.next(10);
    closure_obs.next(20);
    assert_eq!(count, 30);
  }

  #[test]
  fn boxed_observer_forwards_terminal() {
    let seen = std::sync::Arc::new(parking_lot::Mutex::new(None));
    let c_seen = seen.clone();
    let mut boxed: BoxedObserver<i32, &str> = Box::new(observer_fn(
      |_: i32| {},
      move |t: Terminal<&str>| *c_seen.lock() = Some(t.as_label()),
    ));
    boxed.next(1);
    boxed.error("boom");

    assert_eq!(*seen.lock(), Some("failed"));
  }

  #[test]
  fn channel_observer() {
    let (mut tx, mut rx) = unbounded::<Event<i32, ()>>();
    tx.next(1);
    tx.complete();

    assert_eq!(rx.try_next().ok().flatten(), Some(Event::Next(1)));
    assert_eq!(rx.try_next().ok().flatten(), Some(Event::Completed));
  }
}
