use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::ReentrantMutex;

use super::Observer;
use crate::event::{Event, Terminal};

/// Shared "is this source still wanted" flag.
///
/// Owned jointly by a running source and the handle that cancels it. Once
/// killed it never comes back to life.
#[derive(Clone, Default)]
pub(crate) struct Liveness(Arc<AtomicBool>);

impl Liveness {
  #[inline]
  pub(crate) fn kill(&self) { self.0.store(true, Ordering::Release) }

  #[inline]
  pub(crate) fn is_alive(&self) -> bool { !self.0.load(Ordering::Acquire) }
}

type Pending<Item, Err> = VecDeque<(Event<Item, Err>, Option<Liveness>)>;

/// Serializes events from many threads onto one observer.
///
/// Only one thread delivers at a time. Events emitted re-entrantly from inside
/// a callback of the wrapped observer (on the delivering thread) are queued
/// and delivered by the outermost frame once the callback returns, so the
/// call stack never grows with the number of queued events.
pub(crate) struct SerializedObserver<O, Item, Err> {
  slot: ReentrantMutex<Slot<O, Item, Err>>,
}

struct Slot<O, Item, Err> {
  observer: RefCell<Option<O>>,
  pending: RefCell<Pending<Item, Err>>,
  draining: Cell<bool>,
}

struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
  fn drop(&mut self) { self.0.set(false) }
}

impl<O, Item, Err> SerializedObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  pub(crate) fn new(observer: O) -> Self {
    Self {
      slot: ReentrantMutex::new(Slot {
        observer: RefCell::new(Some(observer)),
        pending: RefCell::new(VecDeque::new()),
        draining: Cell::new(false),
      }),
    }
  }

  /// Deliver a value, unless `alive` has been killed by the time the value
  /// reaches the front of the queue.
  #[inline]
  pub(crate) fn next(&self, value: Item, alive: Option<&Liveness>) {
    self.emit(Event::Next(value), alive.cloned());
  }

  #[inline]
  pub(crate) fn terminate(&self, terminal: Terminal<Err>) { self.emit(terminal.into(), None); }

  /// `true` once a terminal signal has been delivered.
  #[cfg(test)]
  pub(crate) fn is_terminated(&self) -> bool {
    let slot = self.slot.lock();
    // Borrowed means a delivery is in progress on this thread.
    slot.observer.try_borrow().map_or(false, |o| o.is_none())
  }

  fn emit(&self, event: Event<Item, Err>, alive: Option<Liveness>) {
    let slot = self.slot.lock();
    slot.pending.borrow_mut().push_back((event, alive));
    if slot.draining.replace(true) {
      return;
    }
    let _guard = DrainGuard(&slot.draining);

    loop {
      let front = slot.pending.borrow_mut().pop_front();
      let Some((event, alive)) = front else { break };
      if alive.is_some_and(|a| !a.is_alive()) {
        continue;
      }

      match event.into_terminal() {
        Err(value) => {
          if let Some(observer) = slot.observer.borrow_mut().as_mut() {
            observer.next(value);
          }
        }
        Ok(terminal) => {
          let observer = slot.observer.borrow_mut().take();
          if let Some(observer) = observer {
            observer.terminate(terminal);
          }
          slot.pending.borrow_mut().clear();
        }
      }
    }
  }
}
