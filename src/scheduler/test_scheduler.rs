//! Deterministic scheduler for tests.
//!
//! Tasks are queued and only run when the test says so, in FIFO order, on
//! the test's own thread.
//!
//! ```rust
//! use rxflatten::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
//! let c_flag = flag.clone();
//! scheduler.schedule(move || c_flag.store(true, std::sync::atomic::Ordering::SeqCst));
//!
//! assert_eq!(scheduler.pending_count(), 1);
//! scheduler.flush();
//! assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
//! ```

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use super::{Scheduler, TaskHandle};

type Job = Box<dyn FnOnce() + Send>;

/// A manually driven task queue.
///
/// Clones share the same queue; separate `new()` calls are independent.
#[derive(Clone, Default)]
pub struct TestScheduler {
  queue: Arc<Mutex<VecDeque<Job>>>,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Number of queued tasks, including cancelled ones not yet discarded.
  pub fn pending_count(&self) -> usize { self.queue.lock().len() }

  /// Run the oldest queued task. Returns `false` if the queue was empty.
  pub fn run_next(&self) -> bool {
    let job = self.queue.lock().pop_front();
    match job {
      Some(job) => {
        job();
        true
      }
      None => false,
    }
  }

  /// Run at most `n` queued tasks, returning how many ran.
  pub fn run(&self, n: usize) -> usize { (0..n).take_while(|_| self.run_next()).count() }

  /// Run queued tasks, including ones scheduled while flushing, until the
  /// queue is empty.
  pub fn flush(&self) { while self.run_next() {} }
}

impl Scheduler for TestScheduler {
  fn schedule<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let (handle, run) = TaskHandle::wrap(task);
    self.queue.lock().push_back(Box::new(run));
    handle
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn fifo_order() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    for i in 0..3 {
      let log = log.clone();
      scheduler.schedule(move || log.lock().push(i));
    }

    assert_eq!(scheduler.run(2), 2);
    assert_eq!(*log.lock(), vec![0, 1]);
    scheduler.flush();
    assert_eq!(*log.lock(), vec![0, 1, 2]);
    assert!(!scheduler.run_next());
  }

  #[test]
  fn tasks_scheduled_while_flushing_run() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (c_scheduler, c_log) = (scheduler.clone(), log.clone());
    scheduler.schedule(move || {
      c_log.lock().push("outer");
      let log = c_log.clone();
      c_scheduler.schedule(move || log.lock().push("inner"));
    });

    scheduler.flush();
    assert_eq!(*log.lock(), vec!["outer", "inner"]);
  }
}
