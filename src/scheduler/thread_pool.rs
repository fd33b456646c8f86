use std::io;

use futures::executor::ThreadPool;
use tracing::trace;

use super::{Scheduler, TaskHandle};

/// Runs tasks on a fixed-size `futures` thread pool.
///
/// However many tasks are scheduled, at most `pool_size` of them execute at
/// the same time; the rest wait in the pool's queue.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// Create a pool with `pool_size` worker threads.
  pub fn new(pool_size: usize) -> io::Result<Self> {
    let pool = ThreadPool::builder()
      .pool_size(pool_size.max(1))
      .name_prefix("rxflatten-pool-")
      .create()?;
    Ok(Self { pool })
  }

  /// Create a pool with one worker per available CPU.
  pub fn with_available_parallelism() -> io::Result<Self> {
    let n = std::thread::available_parallelism().map_or(1, |n| n.get());
    Self::new(n)
  }

  /// Wrap an existing pool.
  pub fn from_pool(pool: ThreadPool) -> Self { Self { pool } }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let (handle, run) = TaskHandle::wrap(task);
    trace!("submitting task to thread pool");
    self.pool.spawn_ok(async move { run() });
    handle
  }
}
