use std::marker::PhantomData;

use crate::{
  observer::{Liveness, Observer, PendingObserver},
  producer::Producer,
  scheduler::{Scheduler, TaskHandle},
  subscription::Subscription,
};

/// Runs a function on a scheduler and emits its result. Created by
/// [`start_on`].
#[derive(Clone)]
pub struct StartOn<S, F, Item> {
  scheduler: S,
  func: F,
  _marker: PhantomData<fn() -> Item>,
}

/// Producer that runs `func` as one task on `scheduler`.
///
/// `Ok(v)` is emitted as a value followed by completion, `Err(e)` as a
/// failure. This is the usual shape of a unit of work flattened by
/// [`flat_map`](crate::producer::ProducerExt::flat_map):
///
/// ```rust
/// use rxflatten::prelude::*;
///
/// let scheduler = ImmediateScheduler;
/// let sizes = from_iter(["a.jpg", "bb.jpg"])
///   .flat_map(FlattenStrategy::Concat, move |name: &'static str| {
///     start_on(scheduler, move || Ok::<_, String>(name.len()))
///   })
///   .wait();
/// assert_eq!(sizes, Ok(vec![5, 6]));
/// ```
pub fn start_on<S, F, Item, Err>(scheduler: S, func: F) -> StartOn<S, F, Item>
where
  S: Scheduler,
  F: FnOnce() -> Result<Item, Err> + Send + 'static,
{
  StartOn { scheduler, func, _marker: PhantomData }
}

/// Subscription of a [`start_on`] producer.
///
/// Cancels the task if it has not run yet; if it is already running, its
/// result is dropped. A task the scheduler drops without running interrupts
/// the observer instead of leaving it waiting.
pub struct StartOnSubscription {
  alive: Liveness,
  task: TaskHandle,
}

impl Subscription for StartOnSubscription {
  fn unsubscribe(self) {
    self.alive.kill();
    self.task.unsubscribe();
  }

  fn is_closed(&self) -> bool { !self.alive.is_alive() || self.task.is_closed() }
}

impl<S, F, Item, Err> Producer<Item, Err> for StartOn<S, F, Item>
where
  S: Scheduler,
  F: FnOnce() -> Result<Item, Err> + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = StartOnSubscription;

  fn start<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let alive = Liveness::default();
    let c_alive = alive.clone();
    let pending = PendingObserver::new(observer, alive.clone());
    let func = self.func;
    let task = self.scheduler.schedule(move || {
      let Some(mut observer) = pending.into_inner() else { return };
      let result = func();
      if !c_alive.is_alive() {
        return;
      }
      match result {
        Ok(v) => {
          observer.next(v);
          observer.complete();
        }
        Err(err) => observer.error(err),
      }
    });
    StartOnSubscription { alive, task }
  }
}

#[cfg(test)]
mod test {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use parking_lot::Mutex;

  use crate::{observer::observer_fn, prelude::*};

  #[test]
  fn runs_on_scheduler() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());

    start_on(scheduler.clone(), || Ok::<_, ()>(7)).start(observer_fn(
      move |v| l1.lock().push(Event::Next(v)),
      move |t: Terminal<()>| l2.lock().push(t.into()),
    ));

    assert!(log.lock().is_empty());
    assert_eq!(scheduler.pending_count(), 1);
    scheduler.flush();
    assert_eq!(*log.lock(), vec![Event::Next(7), Event::Completed]);
  }

  #[test]
  fn cancelled_before_running() {
    let scheduler = TestScheduler::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let c_runs = runs.clone();

    let subscription = start_on(scheduler.clone(), move || {
      c_runs.fetch_add(1, Ordering::SeqCst);
      Ok::<_, ()>(())
    })
    .start(observer_fn(|_: ()| unreachable!(), |_: Terminal<()>| unreachable!()));
    subscription.unsubscribe();
    scheduler.flush();

    assert_eq!(runs.load(Ordering::SeqCst), 0);
  }

  /// Accepts tasks and throws them away, like a pool that shut down.
  #[derive(Clone)]
  struct Discarding;

  impl Scheduler for Discarding {
    fn schedule<F>(&self, task: F) -> TaskHandle
    where
      F: FnOnce() + Send + 'static,
    {
      let (handle, run) = TaskHandle::wrap(task);
      drop(run);
      handle
    }
  }

  #[test]
  fn dropped_task_interrupts() {
    let result = start_on(Discarding, || Ok::<i32, ()>(1)).wait();
    assert_eq!(result, Err(FlattenError::Interrupted));
  }

  #[test]
  fn failure() {
    let scheduler = ImmediateScheduler;
    let result = start_on(scheduler, || Err::<i32, _>("decode failed")).wait();
    assert_eq!(result, Err(FlattenError::Failed("decode failed")));
  }
}
