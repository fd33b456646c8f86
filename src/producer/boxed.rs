use crate::{
  observer::{BoxedObserver, Observer},
  producer::Producer,
  subscription::BoxedSubscription,
};

type StartFn<Item, Err> = Box<dyn FnOnce(BoxedObserver<Item, Err>) -> BoxedSubscription + Send>;

/// A type-erased producer.
///
/// Lets inner producers of different concrete types travel through the same
/// outer stream:
///
/// ```rust
/// use rxflatten::prelude::*;
///
/// let inners: Vec<BoxedProducer<i32, ()>> = vec![of(1).box_it(), from_iter([2, 3]).box_it()];
/// let all = from_iter(inners).flatten(FlattenStrategy::Concat).wait();
/// assert_eq!(all, Ok(vec![1, 2, 3]));
/// ```
pub struct BoxedProducer<Item, Err>(StartFn<Item, Err>);

impl<Item: 'static, Err: 'static> BoxedProducer<Item, Err> {
  pub fn new<P>(producer: P) -> Self
  where
    P: Producer<Item, Err> + Send + 'static,
  {
    BoxedProducer(Box::new(move |observer: BoxedObserver<Item, Err>| {
      BoxedSubscription::new(producer.start(observer))
    }))
  }
}

impl<Item, Err> Producer<Item, Err> for BoxedProducer<Item, Err> {
  type Unsub = BoxedSubscription;

  fn start<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    (self.0)(Box::new(observer))
  }
}
