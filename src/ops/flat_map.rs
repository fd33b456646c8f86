use std::marker::PhantomData;

use crate::{event::Terminal, observer::Observer, producer::Producer};

/// Outer stream of a [`flat_map`](crate::producer::ProducerExt::flat_map):
/// maps every value of `source` into an inner producer.
pub struct FlatMapSource<S, F, Item> {
  source: S,
  func: F,
  _marker: PhantomData<fn(Item)>,
}

impl<S, F, Item> FlatMapSource<S, F, Item> {
  pub(crate) fn new(source: S, func: F) -> Self { Self { source, func, _marker: PhantomData } }
}

impl<S: Clone, F: Clone, Item> Clone for FlatMapSource<S, F, Item> {
  fn clone(&self) -> Self { Self::new(self.source.clone(), self.func.clone()) }
}

impl<S, F, Item, P, Err> Producer<P, Err> for FlatMapSource<S, F, Item>
where
  S: Producer<Item, Err>,
  F: FnMut(Item) -> P + Send + 'static,
  Item: 'static,
{
  type Unsub = S::Unsub;

  fn start<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<P, Err> + Send + 'static,
  {
    self
      .source
      .start(MapObserver { observer, func: self.func, _marker: PhantomData })
  }
}

struct MapObserver<O, F, Item> {
  observer: O,
  func: F,
  _marker: PhantomData<fn(Item)>,
}

impl<O, F, Item, P, Err> Observer<Item, Err> for MapObserver<O, F, Item>
where
  O: Observer<P, Err>,
  F: FnMut(Item) -> P,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  #[inline]
  fn terminate(self, terminal: Terminal<Err>) { self.observer.terminate(terminal) }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
