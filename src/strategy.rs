//! How a stream of producers is flattened into one stream.

use std::{
  fmt::{Display, Formatter},
  num::NonZeroUsize,
  str::FromStr,
};

use crate::error::StrategyParseError;

/// Policy governing how many inner producers run at once and which one wins
/// when a new one arrives.
///
/// Strategies are plain data; the flatten coordinator branches on the
/// variant at its two decision points (a new inner producer arrived, an
/// active one completed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlattenStrategy {
  /// Start every inner producer as soon as it arrives.
  Merge,
  /// One inner producer at a time, in arrival order.
  Concat,
  /// Only the most recent inner producer runs; a new arrival cancels the
  /// active one.
  Latest,
  /// At most `n` inner producers at once; the rest wait in arrival order.
  Concurrent(NonZeroUsize),
}

impl FlattenStrategy {
  /// `Concurrent(limit)`. A limit of 0 is treated as 1.
  pub fn concurrent(limit: usize) -> Self {
    FlattenStrategy::Concurrent(NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN))
  }

  /// `Concurrent(n)` with `n` the parallelism available to this process,
  /// or 1 if that cannot be determined.
  pub fn bounded_by_parallelism() -> Self {
    FlattenStrategy::Concurrent(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
  }

  /// Maximum number of simultaneously active inner producers.
  #[inline]
  pub fn limit(&self) -> usize {
    match self {
      FlattenStrategy::Merge => usize::MAX,
      FlattenStrategy::Concat | FlattenStrategy::Latest => 1,
      FlattenStrategy::Concurrent(n) => n.get(),
    }
  }

  /// `true` when a new arrival replaces the active producer instead of
  /// waiting for it.
  #[inline]
  pub fn supersedes(&self) -> bool { matches!(self, FlattenStrategy::Latest) }
}

impl Default for FlattenStrategy {
  fn default() -> Self { FlattenStrategy::bounded_by_parallelism() }
}

impl Display for FlattenStrategy {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      FlattenStrategy::Merge => f.write_str("merge"),
      FlattenStrategy::Concat => f.write_str("concat"),
      FlattenStrategy::Latest => f.write_str("latest"),
      FlattenStrategy::Concurrent(n) if n.get() == usize::MAX => f.write_str("concurrent:max"),
      FlattenStrategy::Concurrent(n) => write!(f, "concurrent:{n}"),
    }
  }
}

/// Parses `merge`, `concat`, `latest` and `concurrent:<limit>`, where
/// `<limit>` is a positive integer, `max` or `auto` (available parallelism).
impl FromStr for FlattenStrategy {
  type Err = StrategyParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
      "merge" => return Ok(FlattenStrategy::Merge),
      "concat" => return Ok(FlattenStrategy::Concat),
      "latest" => return Ok(FlattenStrategy::Latest),
      _ => {}
    }

    let Some((name, limit)) = s.split_once(':') else {
      return Err(StrategyParseError::Unknown(s.to_owned()));
    };
    if !name.trim().eq_ignore_ascii_case("concurrent") {
      return Err(StrategyParseError::Unknown(s.to_owned()));
    }
    match limit.trim() {
      "max" => Ok(FlattenStrategy::Concurrent(NonZeroUsize::MAX)),
      "auto" => Ok(FlattenStrategy::bounded_by_parallelism()),
      n => n
        .parse::<NonZeroUsize>()
        .map(FlattenStrategy::Concurrent)
        .map_err(|_| StrategyParseError::InvalidLimit(n.to_owned())),
    }
  }
}
