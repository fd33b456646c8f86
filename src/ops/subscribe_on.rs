use crate::{
  observer::{Liveness, Observer, PendingObserver},
  producer::Producer,
  scheduler::{Scheduler, TaskHandle},
  subscription::{SharedSubscription, Subscription},
};

/// Starts `source` from a task on a scheduler.
///
/// Created by [`subscribe_on`](crate::producer::ProducerExt::subscribe_on).
#[derive(Clone)]
pub struct SubscribeOnOp<S, Sch> {
  source: S,
  scheduler: Sch,
}

impl<S, Sch> SubscribeOnOp<S, Sch> {
  pub(crate) fn new(source: S, scheduler: Sch) -> Self { Self { source, scheduler } }
}

/// Subscription of a [`SubscribeOnOp`].
///
/// Cancels the task if it has not run yet, or the started source if it has.
pub struct SubscribeOnSubscription {
  alive: Liveness,
  source: SharedSubscription,
  task: TaskHandle,
}

impl Subscription for SubscribeOnSubscription {
  fn unsubscribe(self) {
    self.alive.kill();
    self.task.unsubscribe();
    self.source.unsubscribe();
  }

  fn is_closed(&self) -> bool {
    !self.alive.is_alive() || (self.task.is_closed() && self.source.is_closed())
  }
}

impl<S, Sch, Item, Err> Producer<Item, Err> for SubscribeOnOp<S, Sch>
where
  S: Producer<Item, Err> + Send + 'static,
  Sch: Scheduler,
  Item: 'static,
  Err: 'static,
{
  type Unsub = SubscribeOnSubscription;

  fn start<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let source = self.source;
    let alive = Liveness::default();
    let pending = PendingObserver::new(observer, alive.clone());
    let subscription = SharedSubscription::new();
    let c_subscription = subscription.clone();
    let task = self.scheduler.schedule(move || {
      if let Some(observer) = pending.into_inner() {
        c_subscription.assign(source.start(observer));
      }
    });
    SubscribeOnSubscription { alive, source: subscription, task }
  }
}
