//! Cancellation handles.
//!
//! A [`Subscription`] is what starting a producer gives back: the right to
//! cancel that one running stream. Unsubscribing is idempotent and a no-op for
//! a stream that already finished on its own.

use std::fmt::{Debug, Formatter};

mod boxed;
mod composite;
mod registry;
mod shared;

pub use boxed::{BoxedSubscription, IntoBoxedSubscription};
pub use composite::CompositeSubscription;
pub use registry::{SubscriptionKey, SubscriptionRegistry};
pub use shared::SharedSubscription;

/// Handle to cancel a running stream.
pub trait Subscription {
  /// Cancel the stream before it has finished emitting.
  fn unsubscribe(self);

  /// `true` when there is nothing left to cancel.
  fn is_closed(&self) -> bool;
}

/// Nothing to cancel: streams that finish synchronously return `()`.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<S: Subscription> Subscription for Option<S> {
  #[inline]
  fn unsubscribe(self) {
    if let Some(s) = self {
      s.unsubscribe()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Subscription::is_closed) }
}

/// Runs a closure as the teardown of a subscription.
pub struct ClosureSubscription<F>(pub F);

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  #[inline]
  fn unsubscribe(self) { (self.0)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

impl<F> Debug for ClosureSubscription<F> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("ClosureSubscription") }
}

/// Two subscriptions released together.
pub struct TupleSubscription<U1, U2>(pub U1, pub U2);

impl<U1: Subscription, U2: Subscription> Subscription for TupleSubscription<U1, U2> {
  fn unsubscribe(self) {
    self.0.unsubscribe();
    self.1.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.0.is_closed() && self.1.is_closed() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }

  /// Disarm the guard and hand the subscription back.
  pub fn into_inner(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(s) = self.0.take() {
      s.unsubscribe()
    }
  }
}

/// Extension to get an RAII guard from any subscription.
pub trait SubscriptionExt: Subscription + Sized {
  /// `unsubscribe()` is called automatically as soon as the returned value
  /// goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately.
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self> { SubscriptionGuard::new(self) }
}

impl<T: Subscription> SubscriptionExt for T {}
