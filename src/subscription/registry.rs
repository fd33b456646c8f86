use smallvec::SmallVec;

use super::Subscription;

/// Opaque handle of an entry in a [`SubscriptionRegistry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionKey(usize);

/// A container of subscriptions keyed by opaque handles.
///
/// Owners that need to find a specific entry again (to detach it when its
/// stream finishes) keep only the [`SubscriptionKey`], never a reference back
/// to the owner of the registry.
///
/// - **SmallVec Optimization**: avoids heap allocation for 0-2 entries.
/// - **Pre-allocation Pattern**: `reserve_key()` + `insert()` hands out a key
///   before the entry exists, which is needed when the entry is the result of
///   starting something that must already know its own key.
///
/// # Examples
///
/// ```rust
/// use rxflatten::subscription::SubscriptionRegistry;
///
/// let mut subs: SubscriptionRegistry<()> = SubscriptionRegistry::default();
///
/// let k1 = subs.add(());
/// let k2 = subs.reserve_key();
/// subs.insert(k2, ());
/// assert_eq!(subs.len(), 2);
///
/// assert!(subs.remove(k1).is_some());
/// assert!(subs.remove(k1).is_none());
/// assert_eq!(subs.len(), 1);
/// ```
pub struct SubscriptionRegistry<U> {
  next_key: usize,
  items: SmallVec<[(SubscriptionKey, U); 2]>,
}

impl<U> Default for SubscriptionRegistry<U> {
  fn default() -> Self { Self { next_key: 0, items: SmallVec::new() } }
}

impl<U> SubscriptionRegistry<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its key.
  #[inline]
  pub fn add(&mut self, item: U) -> SubscriptionKey {
    let key = self.reserve_key();
    self.items.push((key, item));
    key
  }

  /// Reserve the next key without adding an item.
  #[inline]
  pub fn reserve_key(&mut self) -> SubscriptionKey {
    let key = SubscriptionKey(self.next_key);
    self.next_key += 1;
    key
  }

  /// Insert an item under a key obtained from `reserve_key()`.
  #[inline]
  pub fn insert(&mut self, key: SubscriptionKey, item: U) { self.items.push((key, item)); }

  pub fn remove(&mut self, key: SubscriptionKey) -> Option<U> {
    self
      .items
      .iter()
      .position(|(k, _)| *k == key)
      .map(|pos| self.items.swap_remove(pos).1)
  }

  pub fn get_mut(&mut self, key: SubscriptionKey) -> Option<&mut U> {
    self
      .items
      .iter_mut()
      .find(|(k, _)| *k == key)
      .map(|(_, item)| item)
  }

  #[inline]
  pub fn contains(&self, key: SubscriptionKey) -> bool { self.items.iter().any(|(k, _)| *k == key) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Take every item out, leaving the registry empty.
  #[inline]
  pub fn take_all(&mut self) -> SmallVec<[U; 2]> {
    self.items.drain(..).map(|(_, item)| item).collect()
  }
}

impl<U: Subscription> SubscriptionRegistry<U> {
  /// Drop every item that reports itself closed. Returns how many went.
  pub fn prune_closed(&mut self) -> usize {
    let before = self.items.len();
    self.items.retain(|(_, item)| !item.is_closed());
    before - self.items.len()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn keys_are_never_reused() {
    let mut subs = SubscriptionRegistry::new();
    let k1 = subs.add(1);
    subs.remove(k1);
    let k2 = subs.add(2);
    assert_ne!(k1, k2);
    assert!(!subs.contains(k1));
    assert_eq!(subs.get_mut(k2), Some(&mut 2));
  }

  struct Flag(bool);

  impl Subscription for Flag {
    fn unsubscribe(self) {}

    fn is_closed(&self) -> bool { self.0 }
  }

  #[test]
  fn prune_closed_keeps_open_items() {
    let mut subs = SubscriptionRegistry::new();
    subs.add(Flag(true));
    let open = subs.add(Flag(false));
    subs.add(Flag(true));

    assert_eq!(subs.prune_closed(), 2);
    assert_eq!(subs.len(), 1);
    assert!(subs.contains(open));
  }

  #[test]
  fn take_all_empties() {
    let mut subs = SubscriptionRegistry::new();
    subs.add(());
    subs.add(());
    subs.add(());
    assert_eq!(subs.take_all().len(), 3);
    assert!(subs.is_empty());
  }
}
