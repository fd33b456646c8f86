use super::{Scheduler, TaskHandle};

/// Runs every task right away on the calling thread.
#[derive(Clone, Copy, Default, Debug)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    task();
    TaskHandle::finished()
  }
}
