use std::marker::PhantomData;

use tracing::warn;

use super::{Liveness, Observer};

/// Holds an observer on behalf of a scheduled task until the task runs.
///
/// A scheduler is free to drop a task without running it (a pool shutting
/// down, a thread that failed to spawn). When that happens the observer would
/// never hear back, so dropping the guard while it still holds the observer
/// interrupts it, unless `alive` was killed by the cancelling side first.
pub(crate) struct PendingObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  observer: Option<O>,
  alive: Liveness,
  _marker: PhantomData<fn(Item, Err)>,
}

impl<O, Item, Err> PendingObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  pub(crate) fn new(observer: O, alive: Liveness) -> Self {
    Self { observer: Some(observer), alive, _marker: PhantomData }
  }

  /// Take the observer back once the task actually runs.
  #[inline]
  pub(crate) fn into_inner(mut self) -> Option<O> { self.observer.take() }
}

impl<O, Item, Err> Drop for PendingObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  fn drop(&mut self) {
    if let Some(observer) = self.observer.take() {
      if self.alive.is_alive() {
        warn!("scheduled task dropped before it ran, interrupting its stream");
        observer.interrupt();
      }
    }
  }
}
