use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
};

use tracing::{trace, warn};

use super::{Scheduler, TaskHandle};

/// Spawns a new OS thread for every task.
///
/// Nothing bounds how many threads exist at once, so flattening many inner
/// producers onto it with an unbounded strategy creates as many threads as
/// there are producers. The scheduler counts live threads so that effect can
/// be observed.
#[derive(Clone, Default)]
pub struct NewThreadScheduler {
  counters: Arc<ThreadCounters>,
}

#[derive(Default)]
struct ThreadCounters {
  alive: AtomicUsize,
  peak: AtomicUsize,
  spawned: AtomicUsize,
}

struct AliveGuard(Arc<ThreadCounters>);

impl Drop for AliveGuard {
  fn drop(&mut self) { self.0.alive.fetch_sub(1, Ordering::AcqRel); }
}

impl NewThreadScheduler {
  pub fn new() -> Self { Self::default() }

  /// Threads currently running a task.
  pub fn threads_alive(&self) -> usize { self.counters.alive.load(Ordering::Acquire) }

  /// Highest number of threads that were alive at the same time.
  pub fn peak_threads(&self) -> usize { self.counters.peak.load(Ordering::Acquire) }

  /// Threads spawned so far.
  pub fn threads_spawned(&self) -> usize { self.counters.spawned.load(Ordering::Acquire) }
}

impl Scheduler for NewThreadScheduler {
  fn schedule<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let (handle, run) = TaskHandle::wrap(task);
    let counters = self.counters.clone();
    let alive = counters.alive.fetch_add(1, Ordering::AcqRel) + 1;
    counters.peak.fetch_max(alive, Ordering::AcqRel);
    let id = counters.spawned.fetch_add(1, Ordering::AcqRel);
    trace!(thread = id, alive, "spawning task thread");

    let spawned = thread::Builder::new()
      .name(format!("rxflatten-task-{id}"))
      .spawn(move || {
        let _guard = AliveGuard(counters);
        run();
      });
    if let Err(err) = spawned {
      // The closure (and its guard) never ran, so undo the count here.
      self.counters.alive.fetch_sub(1, Ordering::AcqRel);
      warn!(error = %err, "failed to spawn task thread, dropping the task");
    }
    handle
  }
}
