//! Flattening a producer of producers into one stream.
//!
//! All four strategies share one coordinator. The strategy only decides, at
//! two points, whether an inner producer starts now: when it arrives from the
//! outer stream, and when an active inner producer completes.
//!
//! # Locking
//!
//! Every coordinator owns one state mutex. It is held only to update the
//! bookkeeping and to decide what starts next, never while calling out:
//! starting a producer, releasing a subscription and delivering downstream
//! all happen after the lock is dropped. Producers that complete
//! synchronously while being started therefore re-enter the coordinator
//! safely.
//!
//! Producers chosen to start are pushed onto a ready list that exactly one
//! caller at a time drains in a loop. A completion observed while another
//! caller (or an outer frame on the same stack) is draining only appends to
//! that list, so the stack depth stays constant however long the queue is.

use std::{
  collections::VecDeque,
  fmt::{Debug, Formatter},
  marker::PhantomData,
  sync::Arc,
};

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{
  error::ErrorOrigin,
  event::Terminal,
  observer::{Liveness, Observer, SerializedObserver},
  producer::Producer,
  strategy::FlattenStrategy,
  subscription::{BoxedSubscription, Subscription, SubscriptionKey, SubscriptionRegistry},
};

/// Producer that flattens the producers emitted by `source`.
///
/// Created by [`ProducerExt::flatten`](crate::producer::ProducerExt::flatten)
/// and [`ProducerExt::flat_map`](crate::producer::ProducerExt::flat_map).
pub struct FlattenOp<S, P> {
  source: S,
  strategy: FlattenStrategy,
  _marker: PhantomData<fn() -> P>,
}

impl<S, P> FlattenOp<S, P> {
  pub(crate) fn new(source: S, strategy: FlattenStrategy) -> Self {
    Self { source, strategy, _marker: PhantomData }
  }

  pub fn strategy(&self) -> FlattenStrategy { self.strategy }
}

impl<S: Clone, P> Clone for FlattenOp<S, P> {
  fn clone(&self) -> Self { Self::new(self.source.clone(), self.strategy) }
}

/// A snapshot of a running flatten.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlattenStats {
  /// Inner producers admitted and not finished yet.
  pub active: usize,
  /// Inner producers waiting for a free slot.
  pub queued: usize,
  /// Highest `active` seen so far.
  pub peak_active: usize,
  /// Inner producers started so far.
  pub started: usize,
  /// Inner producers that completed normally.
  pub completed: usize,
  /// Whether the merged stream has delivered its terminal event.
  pub terminated: bool,
}

/// Subscription of a running flatten.
///
/// Unsubscribing interrupts the merged stream: the downstream observer
/// receives `Interrupted` (unless it already got a terminal event), the outer
/// stream and every active inner producer are cancelled and queued inner
/// producers are dropped without starting. Clones control the same flatten,
/// and unsubscribing more than once has no further effect.
#[derive(Clone)]
pub struct FlattenSubscription(Arc<dyn FlattenControl>);

impl FlattenSubscription {
  pub fn stats(&self) -> FlattenStats { self.0.stats() }
}

impl Subscription for FlattenSubscription {
  fn unsubscribe(self) { self.0.interrupt() }

  fn is_closed(&self) -> bool { self.0.stats().terminated }
}

impl Debug for FlattenSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("FlattenSubscription").field(&self.stats()).finish()
  }
}

trait FlattenControl: Send + Sync {
  fn interrupt(&self);
  fn stats(&self) -> FlattenStats;
}

impl<S, P, Item, Err> Producer<Item, Err> for FlattenOp<S, P>
where
  S: Producer<P, Err>,
  P: Producer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Unsub = FlattenSubscription;

  fn start<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    debug!(strategy = %self.strategy, "flatten starting");
    let core = Arc::new(Coordinator {
      state: Mutex::new(FlattenState::new(self.strategy)),
      downstream: SerializedObserver::new(observer),
    });
    let outer = self.source.start(OuterObserver { core: core.clone() });
    core.attach_outer(BoxedSubscription::new(outer));
    FlattenSubscription(core)
  }
}

// ============================================================================
// State
// ============================================================================

/// A live inner subscription, found again through its key.
struct InnerEntry {
  alive: Liveness,
  /// `None` until the producer's `start` has returned.
  unsub: Option<BoxedSubscription>,
}

impl Subscription for InnerEntry {
  fn unsubscribe(self) {
    self.alive.kill();
    self.unsub.unsubscribe();
  }

  fn is_closed(&self) -> bool { !self.alive.is_alive() }
}

/// An inner producer that was given a slot but has not been started yet.
struct Admitted<P> {
  key: SubscriptionKey,
  alive: Liveness,
  producer: P,
}

struct FlattenState<P> {
  strategy: FlattenStrategy,
  outer: Option<BoxedSubscription>,
  outer_completed: bool,
  terminated: bool,
  /// Admitted inner producers, started or about to be. Its length is the
  /// active count.
  inners: SubscriptionRegistry<InnerEntry>,
  /// Arrived but not admitted, FIFO.
  queue: VecDeque<P>,
  /// Admitted but not started, FIFO.
  ready: VecDeque<Admitted<P>>,
  draining: bool,
  peak_active: usize,
  started: usize,
  completed: usize,
}

/// Everything a terminated flatten still has to release.
struct Teardown<P> {
  outer: Option<BoxedSubscription>,
  inners: SmallVec<[InnerEntry; 2]>,
  queue: VecDeque<P>,
  ready: VecDeque<Admitted<P>>,
}

impl<P> Teardown<P> {
  fn release(self) {
    let Teardown { outer, inners, queue, ready } = self;
    trace!(
      inners = inners.len(),
      discarded = queue.len() + ready.len(),
      "releasing flatten resources"
    );
    outer.unsubscribe();
    for inner in inners {
      inner.unsubscribe();
    }
  }
}

impl<P> FlattenState<P> {
  fn new(strategy: FlattenStrategy) -> Self {
    Self {
      strategy,
      outer: None,
      outer_completed: false,
      terminated: false,
      inners: SubscriptionRegistry::new(),
      queue: VecDeque::new(),
      ready: VecDeque::new(),
      draining: false,
      peak_active: 0,
      started: 0,
      completed: 0,
    }
  }

  #[inline]
  fn has_capacity(&self) -> bool { self.inners.len() < self.strategy.limit() }

  fn admit(&mut self, producer: P) -> Admitted<P> {
    let key = self.inners.reserve_key();
    let alive = Liveness::default();
    self
      .inners
      .insert(key, InnerEntry { alive: alive.clone(), unsub: None });
    self.peak_active = self.peak_active.max(self.inners.len());
    Admitted { key, alive, producer }
  }

  /// Admit queued producers while there is room.
  fn admit_queued(&mut self) {
    while self.has_capacity() {
      let Some(producer) = self.queue.pop_front() else { break };
      let admitted = self.admit(producer);
      self.ready.push_back(admitted);
    }
  }

  #[inline]
  fn is_done(&self) -> bool {
    self.outer_completed && self.inners.is_empty() && self.queue.is_empty()
  }

  /// Mark the flatten terminated and take everything that must be released.
  fn terminate(&mut self) -> Teardown<P> {
    self.terminated = true;
    let inners = self.inners.take_all();
    for inner in &inners {
      inner.alive.kill();
    }
    Teardown {
      outer: self.outer.take(),
      inners,
      queue: std::mem::take(&mut self.queue),
      ready: std::mem::take(&mut self.ready),
    }
  }

  fn stats(&self) -> FlattenStats {
    FlattenStats {
      active: self.inners.len(),
      queued: self.queue.len(),
      peak_active: self.peak_active,
      started: self.started,
      completed: self.completed,
      terminated: self.terminated,
    }
  }
}

// ============================================================================
// Coordinator
// ============================================================================

struct Coordinator<P, O, Item, Err> {
  state: Mutex<FlattenState<P>>,
  downstream: SerializedObserver<O, Item, Err>,
}

impl<P, O, Item, Err> Coordinator<P, O, Item, Err>
where
  P: Producer<Item, Err> + Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn attach_outer(&self, outer: BoxedSubscription) {
    let mut state = self.state.lock();
    if state.terminated {
      drop(state);
      outer.unsubscribe();
    } else {
      state.outer = Some(outer);
    }
  }

  fn outer_next(self: &Arc<Self>, producer: P) {
    let (admitted, superseded) = {
      let mut state = self.state.lock();
      if state.terminated {
        return;
      }
      let superseded = if state.strategy.supersedes() {
        let superseded = state.inners.take_all();
        for inner in &superseded {
          inner.alive.kill();
        }
        superseded
      } else {
        SmallVec::new()
      };

      if state.has_capacity() {
        let admitted = state.admit(producer);
        trace!(active = state.inners.len(), "inner producer admitted");
        (Some(admitted), superseded)
      } else {
        state.queue.push_back(producer);
        trace!(queued = state.queue.len(), "inner producer queued");
        (None, superseded)
      }
    };

    // The replaced producer is fully released before its successor starts.
    if !superseded.is_empty() {
      trace!(count = superseded.len(), "cancelling superseded inner producer");
    }
    for inner in superseded {
      inner.unsubscribe();
    }
    if let Some(admitted) = admitted {
      self.drain(Some(admitted));
    }
  }

  fn outer_complete(&self) {
    let teardown = {
      let mut state = self.state.lock();
      if state.terminated {
        return;
      }
      state.outer_completed = true;
      trace!(
        active = state.inners.len(),
        queued = state.queue.len(),
        "outer stream completed"
      );
      if !state.is_done() {
        return;
      }
      state.terminate()
    };
    self.finish(Terminal::Completed, teardown);
  }

  fn inner_completed(self: &Arc<Self>, key: SubscriptionKey) {
    let (teardown, detached) = {
      let mut state = self.state.lock();
      if state.terminated {
        return;
      }
      // Absent when the producer was superseded before it finished.
      let Some(detached) = state.inners.remove(key) else { return };
      state.completed += 1;
      state.admit_queued();
      let teardown = state.is_done().then(|| state.terminate());
      (teardown, detached)
    };
    drop(detached);

    match teardown {
      Some(teardown) => self.finish(Terminal::Completed, teardown),
      None => self.drain(None),
    }
  }

  /// Terminate with `err`. An inner failure only counts while that inner is
  /// still registered.
  fn fail(&self, err: Err, origin: ErrorOrigin, key: Option<SubscriptionKey>) {
    let teardown = {
      let mut state = self.state.lock();
      if state.terminated || key.is_some_and(|key| !state.inners.contains(key)) {
        return;
      }
      state.terminate()
    };
    debug!(origin = origin.as_label(), "flatten failed");
    self.finish(Terminal::Failed(err), teardown);
  }

  fn finish(&self, terminal: Terminal<Err>, teardown: Teardown<P>) {
    debug!(terminal = terminal.as_label(), "flatten terminated");
    self.downstream.terminate(terminal);
    teardown.release();
  }

  /// Queue `admitted` for starting and, unless some caller is already doing
  /// it, start everything that is ready.
  fn drain(self: &Arc<Self>, admitted: Option<Admitted<P>>) {
    let mut state = self.state.lock();
    if let Some(admitted) = admitted {
      if state.terminated || !state.inners.contains(admitted.key) {
        return;
      }
      state.ready.push_back(admitted);
    }
    if state.draining {
      return;
    }
    state.draining = true;

    loop {
      let Some(admitted) = state.ready.pop_front() else { break };
      // Superseded or torn down while it waited.
      if !state.inners.contains(admitted.key) {
        continue;
      }
      state.started += 1;
      drop(state);
      self.start_inner(admitted);
      state = self.state.lock();
    }
    state.draining = false;
  }

  fn start_inner(self: &Arc<Self>, admitted: Admitted<P>) {
    let Admitted { key, alive, producer } = admitted;
    trace!(?key, "starting inner producer");
    let observer = InnerObserver { core: self.clone(), key, alive };
    let unsub = BoxedSubscription::new(producer.start(observer));

    let mut state = self.state.lock();
    match state.inners.get_mut(key) {
      Some(entry) => entry.unsub = Some(unsub),
      // Finished or cancelled while starting.
      None => {
        drop(state);
        unsub.unsubscribe();
      }
    }
  }
}

impl<P, O, Item, Err> FlattenControl for Coordinator<P, O, Item, Err>
where
  P: Producer<Item, Err> + Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn interrupt(&self) {
    let teardown = {
      let mut state = self.state.lock();
      if state.terminated {
        return;
      }
      state.terminate()
    };
    self.finish(Terminal::Interrupted, teardown);
  }

  fn stats(&self) -> FlattenStats { self.state.lock().stats() }
}

// ============================================================================
// Observers
// ============================================================================

struct OuterObserver<P, O, Item, Err> {
  core: Arc<Coordinator<P, O, Item, Err>>,
}

impl<P, O, Item, Err> Observer<P, Err> for OuterObserver<P, O, Item, Err>
where
  P: Producer<Item, Err> + Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn next(&mut self, producer: P) { self.core.outer_next(producer) }

  fn terminate(self, terminal: Terminal<Err>) {
    match terminal {
      Terminal::Completed => self.core.outer_complete(),
      Terminal::Failed(err) => self.core.fail(err, ErrorOrigin::Outer, None),
      Terminal::Interrupted => self.core.interrupt(),
    }
  }

  fn is_closed(&self) -> bool { self.core.state.lock().terminated }
}

struct InnerObserver<P, O, Item, Err> {
  core: Arc<Coordinator<P, O, Item, Err>>,
  key: SubscriptionKey,
  alive: Liveness,
}

impl<P, O, Item, Err> Observer<Item, Err> for InnerObserver<P, O, Item, Err>
where
  P: Producer<Item, Err> + Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn next(&mut self, value: Item) {
    if self.alive.is_alive() {
      self.core.downstream.next(value, Some(&self.alive));
    }
  }

  fn terminate(self, terminal: Terminal<Err>) {
    if !self.alive.is_alive() {
      return;
    }
    match terminal {
      Terminal::Completed => self.core.inner_completed(self.key),
      Terminal::Failed(err) => self.core.fail(err, ErrorOrigin::Inner, Some(self.key)),
      Terminal::Interrupted => self.core.interrupt(),
    }
  }

  fn is_closed(&self) -> bool { !self.alive.is_alive() }
}
