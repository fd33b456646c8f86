//! Execution contexts.
//!
//! The flatten engine never creates threads. Work that should run elsewhere
//! is handed to a [`Scheduler`] supplied by the caller, which decides where
//! and when it runs. Nothing here is a process-wide singleton: every
//! scheduler is a value the caller creates and injects.

use std::sync::{
  atomic::{AtomicU8, Ordering},
  Arc,
};

use crate::subscription::Subscription;

mod immediate;
mod new_thread;
mod test_scheduler;
#[cfg(feature = "futures-scheduler")]
mod thread_pool;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use immediate::ImmediateScheduler;
pub use new_thread::NewThreadScheduler;
pub use test_scheduler::TestScheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// Runs tasks later, possibly on another thread.
pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Queue `task` for execution. The returned handle cancels it as long as it
  /// has not started running.
  fn schedule<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static;
}

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Handle to a scheduled task.
///
/// Unsubscribing cancels the task if it is still pending; a task that already
/// started runs to the end.
#[derive(Clone)]
pub struct TaskHandle(Arc<AtomicU8>);

impl TaskHandle {
  /// A handle for work that already ran.
  pub fn finished() -> Self { TaskHandle(Arc::new(AtomicU8::new(FINISHED))) }

  /// Wrap `task` so that it only runs if the returned handle was not
  /// cancelled first. Scheduler implementations submit the wrapped closure.
  pub fn wrap<F>(task: F) -> (TaskHandle, impl FnOnce() + Send + 'static)
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle(Arc::new(AtomicU8::new(PENDING)));
    let state = handle.0.clone();
    let run = move || {
      if state
        .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
      {
        task();
        state.store(FINISHED, Ordering::Release);
      }
    };
    (handle, run)
  }

  #[inline]
  pub fn is_finished(&self) -> bool { self.0.load(Ordering::Acquire) == FINISHED }

  #[inline]
  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) == CANCELLED }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    let _ = self
      .0
      .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire);
  }

  fn is_closed(&self) -> bool { matches!(self.0.load(Ordering::Acquire), FINISHED | CANCELLED) }
}

#[cfg(test)]
mod test {
  use std::sync::atomic::AtomicUsize;

  use super::*;

  #[test]
  fn cancelled_task_never_runs() {
    let runs = Arc::new(AtomicUsize::new(0));
    let c_runs = runs.clone();
    let (handle, run) = TaskHandle::wrap(move || {
      c_runs.fetch_add(1, Ordering::SeqCst);
    });
    handle.clone().unsubscribe();
    run();

    assert!(handle.is_cancelled());
    assert!(handle.is_closed());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn finished_task_ignores_cancel() {
    let (handle, run) = TaskHandle::wrap(|| {});
    run();
    handle.clone().unsubscribe();
    assert!(handle.is_finished());
    assert!(TaskHandle::finished().is_closed());
  }
}
