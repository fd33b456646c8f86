//! Synchronous producers.
//!
//! These emit everything during `start` and return `()`, since by the time
//! the caller gets the subscription there is nothing left to cancel.

use std::marker::PhantomData;

use crate::{observer::Observer, producer::Producer};

/// Emits one value, then completes. Created by [`of`].
#[derive(Clone)]
pub struct Of<Item, Err>(Item, PhantomData<fn() -> Err>);

pub fn of<Item, Err>(value: Item) -> Of<Item, Err> { Of(value, PhantomData) }

impl<Item, Err> Producer<Item, Err> for Of<Item, Err> {
  type Unsub = ();

  fn start<O>(self, mut observer: O)
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.next(self.0);
    observer.complete();
  }
}

/// Emits every item of an iterator, then completes. Created by
/// [`from_iter`].
#[derive(Clone)]
pub struct FromIter<I, Err>(I, PhantomData<fn() -> Err>);

pub fn from_iter<I, Err>(iter: I) -> FromIter<I, Err>
where
  I: IntoIterator,
{
  FromIter(iter, PhantomData)
}

impl<I, Err> Producer<I::Item, Err> for FromIter<I, Err>
where
  I: IntoIterator,
{
  type Unsub = ();

  fn start<O>(self, mut observer: O)
  where
    O: Observer<I::Item, Err> + Send + 'static,
  {
    for v in self.0 {
      if observer.is_closed() {
        return;
      }
      observer.next(v);
    }
    observer.complete();
  }
}

/// Completes without emitting. Created by [`empty`].
pub struct Empty<Item, Err>(PhantomData<fn() -> (Item, Err)>);

pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { empty() }
}

impl<Item, Err> Producer<Item, Err> for Empty<Item, Err> {
  type Unsub = ();

  fn start<O>(self, observer: O)
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.complete();
  }
}

/// Fails immediately. Created by [`throw`].
#[derive(Clone)]
pub struct Throw<Item, Err>(Err, PhantomData<fn() -> Item>);

pub fn throw<Item, Err>(err: Err) -> Throw<Item, Err> { Throw(err, PhantomData) }

impl<Item, Err> Producer<Item, Err> for Throw<Item, Err> {
  type Unsub = ();

  fn start<O>(self, observer: O)
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.error(self.0);
  }
}

/// Never emits and never terminates. Created by [`never`].
pub struct Never<Item, Err>(PhantomData<fn() -> (Item, Err)>);

pub fn never<Item, Err>() -> Never<Item, Err> { Never(PhantomData) }

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { never() }
}

impl<Item, Err> Producer<Item, Err> for Never<Item, Err> {
  type Unsub = ();

  fn start<O>(self, _observer: O)
  where
    O: Observer<Item, Err> + Send + 'static,
  {
  }
}

#[cfg(test)]
mod test {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::{event::Terminal, observer::observer_fn, prelude::*};

  fn record<Item: Send + 'static, Err: Send + 'static>(
    p: impl Producer<Item, Err>,
  ) -> Vec<Event<Item, Err>> {
    let log = Arc::new(Mutex::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    p.start(observer_fn(
      move |v| l1.lock().push(Event::Next(v)),
      move |t: Terminal<Err>| l2.lock().push(t.into()),
    ));
    let mut log = log.lock();
    std::mem::take(&mut *log)
  }

  #[test]
  fn of_emits_once() {
    assert_eq!(record(of::<_, ()>(1)), vec![Event::Next(1), Event::Completed]);
  }

  #[test]
  fn from_iter_emits_all() {
    assert_eq!(
      record(from_iter::<_, ()>(0..3)),
      vec![Event::Next(0), Event::Next(1), Event::Next(2), Event::Completed]
    );
  }

  #[test]
  fn empty_and_throw() {
    assert_eq!(record(empty::<i32, ()>()), vec![Event::Completed]);
    assert_eq!(record(throw::<i32, _>("e")), vec![Event::Failed("e")]);
    assert!(record(never::<i32, ()>()).is_empty());
  }

  #[test]
  fn from_iter_stops_when_observer_closes() {
    let (tx, mut rx) = futures::channel::mpsc::unbounded::<Event<i32, ()>>();
    rx.close();
    from_iter(0..1_000_000).start(tx);
    assert!(rx.try_next().ok().flatten().is_none());
  }
}
