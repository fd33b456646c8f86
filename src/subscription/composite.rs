use std::sync::Arc;

use parking_lot::Mutex;

use super::{BoxedSubscription, Subscription, SubscriptionKey, SubscriptionRegistry};

/// A group of subscriptions released together.
///
/// Cloning yields another handle to the same group. Unsubscribing any handle
/// releases every child exactly once, however many threads race to do it;
/// children added afterwards are released on the spot.
///
/// Children that finish on their own are dropped from the group the next
/// time it is touched through [`add`](Self::add) or [`len`](Self::len), and
/// a child that is already closed is never attached.
#[derive(Clone, Default)]
pub struct CompositeSubscription(Arc<Mutex<Inner>>);

#[derive(Default)]
struct Inner {
  closed: bool,
  children: SubscriptionRegistry<BoxedSubscription>,
}

impl CompositeSubscription {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add a child. Returns `None` (after releasing the child) if the group is
  /// already released, and `None` without attaching it if the child is
  /// already closed.
  pub fn add(&self, subscription: impl Subscription + Send + 'static) -> Option<SubscriptionKey> {
    if subscription.is_closed() {
      return None;
    }
    let mut inner = self.0.lock();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
      None
    } else {
      inner.children.prune_closed();
      Some(inner.children.add(BoxedSubscription::new(subscription)))
    }
  }

  /// Detach a child without releasing it.
  pub fn remove(&self, key: SubscriptionKey) -> Option<BoxedSubscription> {
    self.0.lock().children.remove(key)
  }

  /// Number of attached children still open.
  pub fn len(&self) -> usize {
    let mut inner = self.0.lock();
    inner.children.prune_closed();
    inner.children.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Subscription for CompositeSubscription {
  fn unsubscribe(self) {
    let children = {
      let mut inner = self.0.lock();
      if inner.closed {
        return;
      }
      inner.closed = true;
      inner.children.take_all()
    };
    // Released outside the lock: a child's teardown may touch this group.
    for child in children {
      child.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.lock().closed }
}
