use tokio::runtime::Handle;
use tracing::trace;

use super::{Scheduler, TaskHandle};

/// Runs tasks on a tokio runtime's blocking thread pool.
///
/// Tasks are plain closures that may block, so they go through
/// `spawn_blocking` rather than the async worker threads.
#[derive(Clone)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { Self { handle } }

  /// Use the runtime the caller is running inside.
  ///
  /// # Panics
  ///
  /// Panics when called outside of a tokio runtime.
  pub fn current() -> Self { Self::new(Handle::current()) }
}

impl Scheduler for TokioScheduler {
  fn schedule<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let (handle, run) = TaskHandle::wrap(task);
    trace!("submitting task to tokio blocking pool");
    // Cancellation goes through the handle, the join handle is not needed.
    drop(self.handle.spawn_blocking(run));
    handle
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::prelude::*;

  #[tokio::test(flavor = "multi_thread")]
  async fn flatten_on_tokio() {
    let scheduler = TokioScheduler::current();
    let values = from_iter(0..20)
      .flat_map(FlattenStrategy::concurrent(4), move |i: i32| {
        start_on(scheduler.clone(), move || Ok::<_, ()>(i * 2))
      })
      .collect_into_future()
      .await
      .unwrap();

    let mut values = values;
    values.sort();
    assert_eq!(values, (0..20).map(|i| i * 2).collect::<Vec<_>>());
  }
}
