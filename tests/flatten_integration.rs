//! Integration tests for the flatten engine.
//!
//! Covers strategies running on real thread pools, cancellation across
//! threads and the interaction with the schedulers shipped by the crate.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::Duration,
};

use futures::{channel::mpsc::unbounded, executor::block_on, StreamExt};
use rxflatten::prelude::*;

/// Tracks how many work functions run at the same time.
#[derive(Clone, Default)]
struct Gauge {
  current: Arc<AtomicUsize>,
  peak: Arc<AtomicUsize>,
}

impl Gauge {
  fn enter(&self) -> GaugeGuard {
    let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
    GaugeGuard(self.current.clone())
  }

  fn peak(&self) -> usize { self.peak.load(Ordering::SeqCst) }
}

struct GaugeGuard(Arc<AtomicUsize>);

impl Drop for GaugeGuard {
  fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
}

fn render<S: Scheduler>(
  scheduler: S, gauge: Gauge, image: usize, cost: Duration,
) -> impl Producer<usize, String> + Send + 'static {
  start_on(scheduler, move || {
    let _running = gauge.enter();
    thread::sleep(cost);
    Ok(image)
  })
}

#[cfg(feature = "futures-scheduler")]
#[test]
fn bounded_render_of_360_images() {
  let scheduler = ThreadPoolScheduler::new(16).unwrap();
  let gauge = Gauge::default();
  let c_gauge = gauge.clone();
  let (tx, rx) = unbounded();

  let subscription = from_iter(0..360)
    .flat_map(FlattenStrategy::concurrent(8), move |image: usize| {
      render(scheduler.clone(), c_gauge.clone(), image, Duration::from_millis(1))
    })
    .start(tx);
  let events: Vec<Event<usize, String>> = block_on(rx.collect());

  let (values, terminals): (Vec<_>, Vec<_>) = events.into_iter().partition(|e| !e.is_terminal());
  assert_eq!(values.len(), 360);
  assert_eq!(terminals, vec![Event::Completed]);
  assert!(gauge.peak() <= 8, "peak was {}", gauge.peak());

  let stats = subscription.stats();
  assert_eq!(stats.active, 0);
  assert_eq!(stats.queued, 0);
  assert_eq!(stats.started, 360);
  assert_eq!(stats.completed, 360);
  assert!(stats.peak_active <= 8);
  assert!(stats.terminated);
}

#[cfg(feature = "futures-scheduler")]
#[test]
fn every_value_arrives_exactly_once() {
  let scheduler = ThreadPoolScheduler::with_available_parallelism().unwrap();
  let gauge = Gauge::default();
  let mut values = from_iter(0..200)
    .flat_map(FlattenStrategy::Merge, move |image: usize| {
      render(scheduler.clone(), gauge.clone(), image, Duration::ZERO)
    })
    .wait()
    .unwrap();

  values.sort();
  assert_eq!(values, (0..200).collect::<Vec<_>>());
}

#[test]
fn unbounded_merge_spawns_a_thread_per_producer() {
  let merged = NewThreadScheduler::new();
  let bounded = NewThreadScheduler::new();
  let run = |scheduler: NewThreadScheduler, strategy: FlattenStrategy| {
    let gauge = Gauge::default();
    let c_gauge = gauge.clone();
    let values = from_iter(0..32)
      .flat_map(strategy, move |image: usize| {
        render(scheduler.clone(), c_gauge.clone(), image, Duration::from_millis(20))
      })
      .wait()
      .unwrap();
    assert_eq!(values.len(), 32);
    gauge.peak()
  };

  let merged_peak = run(merged.clone(), FlattenStrategy::Merge);
  let bounded_peak = run(bounded.clone(), FlattenStrategy::concurrent(4));

  assert_eq!(merged.threads_spawned(), 32);
  assert!(merged.peak_threads() > 4);
  assert!(merged_peak > 4);

  assert_eq!(bounded.threads_spawned(), 32);
  assert!(bounded_peak <= 4);
  // A finishing thread may start its successor before it exits.
  assert!(bounded.peak_threads() <= 8);
}

#[test]
fn latest_only_runs_the_last_query() {
  let scheduler = TestScheduler::new();
  let c_scheduler = scheduler.clone();
  let (tx, rx) = unbounded();

  from_iter(["r", "ru", "rus", "rust"])
    .flat_map(FlattenStrategy::Latest, move |query: &'static str| {
      start_on(c_scheduler.clone(), move || Ok::<_, ()>(format!("results for {query}")))
    })
    .start(tx);

  assert_eq!(scheduler.pending_count(), 4);
  scheduler.flush();

  let events: Vec<_> = block_on(rx.collect());
  assert_eq!(
    events,
    vec![Event::Next("results for rust".to_string()), Event::Completed]
  );
}

#[cfg(feature = "futures-scheduler")]
#[test]
fn failure_stops_the_pipeline() {
  let scheduler = ThreadPoolScheduler::new(4).unwrap();
  let started = Arc::new(AtomicUsize::new(0));
  let c_started = started.clone();

  let result = from_iter(0..100)
    .flat_map(FlattenStrategy::concurrent(2), move |image: usize| {
      let started = c_started.clone();
      start_on(scheduler.clone(), move || {
        started.fetch_add(1, Ordering::SeqCst);
        if image == 3 { Err(format!("image {image} is corrupt")) } else { Ok(image) }
      })
    })
    .wait();

  assert_eq!(result, Err(FlattenError::Failed("image 3 is corrupt".to_string())));
  // The remaining images were queued and discarded.
  thread::sleep(Duration::from_millis(20));
  assert!(started.load(Ordering::SeqCst) <= 6);
}

#[test]
fn composite_cancels_every_flatten() {
  let composite = CompositeSubscription::new();
  let mut channels = vec![];
  let mut handles = vec![];

  for strategy in [FlattenStrategy::Merge, FlattenStrategy::concurrent(2)] {
    let (tx, rx) = unbounded::<Event<i32, ()>>();
    let subscription = from_iter(0..5)
      .flat_map(strategy, |_: i32| never::<i32, ()>())
      .start(tx);
    handles.push(subscription.clone());
    composite.add(subscription);
    channels.push(rx);
  }

  assert_eq!(composite.len(), 2);
  composite.clone().unsubscribe();

  for rx in channels {
    let events: Vec<_> = block_on(rx.collect());
    assert_eq!(events, vec![Event::Interrupted]);
  }
  for handle in handles {
    assert!(handle.is_closed());
    assert_eq!(handle.stats().active, 0);
  }
}

#[test]
fn composite_forgets_finished_flattens() {
  let composite = CompositeSubscription::new();

  let finished = from_iter(0..3)
    .flat_map(FlattenStrategy::Merge, of::<i32, ()>)
    .start(observer_fn(|_: i32| {}, |_: Terminal<()>| {}));
  assert!(finished.is_closed());
  assert!(composite.add(finished).is_none());
  assert_eq!(composite.len(), 0);

  let scheduler = TestScheduler::new();
  let c_scheduler = scheduler.clone();
  let running = from_iter(0..3)
    .flat_map(FlattenStrategy::Merge, move |i: i32| {
      start_on(c_scheduler.clone(), move || Ok::<_, ()>(i))
    })
    .start(observer_fn(|_: i32| {}, |_: Terminal<()>| {}));
  assert!(composite.add(running).is_some());
  assert_eq!(composite.len(), 1);

  scheduler.flush();
  assert_eq!(composite.len(), 0);
  assert!(!composite.is_closed());
}

#[test]
fn strategy_from_configuration() {
  let strategy: FlattenStrategy = "concurrent:3".parse().unwrap();
  let scheduler = TestScheduler::new();
  let c_scheduler = scheduler.clone();

  let subscription = from_iter(0..10)
    .flat_map(strategy, move |i: i32| start_on(c_scheduler.clone(), move || Ok::<_, ()>(i)))
    .start(observer_fn(|_: i32| {}, |_: Terminal<()>| {}));

  assert_eq!(scheduler.pending_count(), 3);
  assert_eq!(subscription.stats().queued, 7);
  scheduler.run(1);
  assert_eq!(scheduler.pending_count(), 3);
  scheduler.flush();
  assert_eq!(subscription.stats().completed, 10);
  assert!(subscription.is_closed());
}

#[cfg(feature = "futures-scheduler")]
#[test]
fn cancel_from_another_thread() {
  let scheduler = ThreadPoolScheduler::new(2).unwrap();
  let (tx, rx) = unbounded();

  let subscription = from_iter(0..1_000)
    .flat_map(FlattenStrategy::concurrent(2), move |i: u64| {
      start_on(scheduler.clone(), move || {
        thread::sleep(Duration::from_millis(1));
        Ok::<_, ()>(i)
      })
    })
    .start(tx);

  let canceller = thread::spawn(move || {
    thread::sleep(Duration::from_millis(10));
    subscription.unsubscribe();
  });
  canceller.join().unwrap();

  let events: Vec<_> = block_on(rx.collect());
  let values = events.iter().filter(|e| !e.is_terminal()).count();
  assert!(values < 1_000);
  assert_eq!(events.last(), Some(&Event::Interrupted));
}
