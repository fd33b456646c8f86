//! Renders a batch of synthetic images with bounded parallelism.
//!
//! Every one of the 36 images is rendered 10 times over, and each render is
//! an inner producer running on a scheduler. The flatten strategy decides
//! how many renders run at once; `FLATTEN_SCHEDULER` picks where they run,
//! either a fixed thread pool (`pool`, the default) or one thread per render
//! (`new-thread`):
//!
//! ```sh
//! FLATTEN_STRATEGY=concurrent:4 RUST_LOG=rxflatten=debug cargo run --example render_pipeline
//! FLATTEN_SCHEDULER=new-thread FLATTEN_STRATEGY=merge cargo run --example render_pipeline
//! FLATTEN_SCHEDULER=new-thread FLATTEN_STRATEGY=concurrent:4 cargo run --example render_pipeline
//! ```
//!
//! With `new-thread` the log reports how many threads were alive at the same
//! time, which is where an unbounded merge shows its cost.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::{Duration, Instant},
};

use rxflatten::prelude::*;
use tracing::info;

const IMAGES: usize = 36;
const ROUNDS: usize = 10;

struct Image {
  name: String,
  width: u32,
  height: u32,
}

struct Thumbnail {
  name: String,
  pixels: u64,
}

#[derive(Clone, Default)]
struct Load {
  running: Arc<AtomicUsize>,
  peak: Arc<AtomicUsize>,
}

/// The work function: pretend to decode and scale one image.
fn render(image: Image, load: &Load) -> Result<Thumbnail, String> {
  let now = load.running.fetch_add(1, Ordering::SeqCst) + 1;
  load.peak.fetch_max(now, Ordering::SeqCst);

  let pixels = u64::from(image.width) * u64::from(image.height);
  thread::sleep(Duration::from_micros(pixels / 2_000));

  load.running.fetch_sub(1, Ordering::SeqCst);
  Ok(Thumbnail { name: image.name, pixels: pixels / 16 })
}

fn catalogue() -> impl Iterator<Item = Image> {
  (0..ROUNDS).flat_map(|round| {
    (0..IMAGES).map(move |i| Image {
      name: format!("round-{round:02}/img-{i:02}.png"),
      width: 640 + (i as u32 % 6) * 128,
      height: 480 + (i as u32 % 4) * 96,
    })
  })
}

fn render_all<S: Scheduler>(
  scheduler: S, strategy: FlattenStrategy, load: &Load,
) -> Result<Vec<Thumbnail>, FlattenError<String>> {
  let load = load.clone();
  from_iter(catalogue())
    .flat_map(strategy, move |image: Image| {
      let load = load.clone();
      start_on(scheduler.clone(), move || render(image, &load))
    })
    .wait()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let strategy: FlattenStrategy = std::env::var("FLATTEN_STRATEGY")
    .unwrap_or_else(|_| "concurrent:auto".to_owned())
    .parse()?;
  let scheduler = std::env::var("FLATTEN_SCHEDULER").unwrap_or_else(|_| "pool".to_owned());
  let load = Load::default();
  info!(%strategy, %scheduler, images = IMAGES * ROUNDS, "rendering");

  let started = Instant::now();
  let thumbnails = match scheduler.as_str() {
    "pool" => render_all(ThreadPoolScheduler::new(16)?, strategy, &load)?,
    "new-thread" => {
      let threads = NewThreadScheduler::new();
      let thumbnails = render_all(threads.clone(), strategy, &load)?;
      info!(
        peak_threads = threads.peak_threads(),
        threads_spawned = threads.threads_spawned(),
        "thread usage"
      );
      thumbnails
    }
    other => {
      return Err(format!("unknown FLATTEN_SCHEDULER {other:?}, expected pool or new-thread").into())
    }
  };

  let pixels: u64 = thumbnails.iter().map(|t| t.pixels).sum();
  if let Some(last) = thumbnails.last() {
    info!(last = %last.name, "last thumbnail");
  }
  info!(
    processed = thumbnails.len(),
    peak_concurrency = load.peak.load(Ordering::SeqCst),
    pixels,
    elapsed = ?started.elapsed(),
    "done"
  );
  Ok(())
}
