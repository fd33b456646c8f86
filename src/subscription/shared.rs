use std::sync::Arc;

use parking_lot::Mutex;

use super::{BoxedSubscription, Subscription};

/// A clonable slot for a subscription that may only exist later.
///
/// Used where the thing to cancel is created on another thread after the
/// handle was already given out (for example a producer started from a
/// scheduled task). If the handle is released before the subscription is
/// assigned, the subscription is released as soon as it arrives.
#[derive(Clone, Default)]
pub struct SharedSubscription(Arc<Mutex<Slot>>);

#[derive(Default)]
struct Slot {
  closed: bool,
  current: Option<BoxedSubscription>,
}

impl SharedSubscription {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Put `subscription` into the slot, releasing whatever was there before.
  pub fn assign(&self, subscription: impl Subscription + Send + 'static) {
    let mut slot = self.0.lock();
    if slot.closed {
      drop(slot);
      subscription.unsubscribe();
    } else {
      let prev = slot.current.replace(BoxedSubscription::new(subscription));
      drop(slot);
      prev.unsubscribe();
    }
  }
}

impl Subscription for SharedSubscription {
  fn unsubscribe(self) {
    let current = {
      let mut slot = self.0.lock();
      slot.closed = true;
      slot.current.take()
    };
    current.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.0.lock().closed }
}
