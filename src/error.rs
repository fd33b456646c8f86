//! Error types.
//!
//! The engine itself is generic over the stream's error type and passes the
//! first error through unchanged. The types here cover the places where the
//! crate has to say something on its own: the outcome of waiting on a
//! stream, and parsing a strategy from configuration.

use thiserror::Error;

/// Why a stream that was waited on did not produce its values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError<E> {
  /// The stream failed; carries the first error any of its sources reported.
  #[error("stream failed: {0}")]
  Failed(E),
  /// The stream was cancelled before it completed.
  #[error("stream was interrupted before it completed")]
  Interrupted,
}

impl<E> FlattenError<E> {
  /// Returns a short stable label for use in logs.
  pub fn as_label(&self) -> &'static str {
    match self {
      FlattenError::Failed(_) => "failed",
      FlattenError::Interrupted => "interrupted",
    }
  }
}

/// Which side of a flatten reported a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorOrigin {
  /// The stream of inner producers itself failed.
  Outer,
  /// One of the inner producers failed.
  Inner,
}

impl ErrorOrigin {
  pub fn as_label(&self) -> &'static str {
    match self {
      ErrorOrigin::Outer => "outer",
      ErrorOrigin::Inner => "inner",
    }
  }
}

/// A strategy string that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyParseError {
  #[error("unknown flatten strategy `{0}`, expected merge, concat, latest or concurrent:<limit>")]
  Unknown(String),
  #[error("invalid concurrency limit `{0}`, expected a positive integer, `max` or `auto`")]
  InvalidLimit(String),
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn messages() {
    let err: FlattenError<String> = FlattenError::Failed("disk".into());
    assert_eq!(err.to_string(), "stream failed: disk");
    assert_eq!(err.as_label(), "failed");
    assert_eq!(
      FlattenError::<String>::Interrupted.to_string(),
      "stream was interrupted before it completed"
    );
    assert_eq!(ErrorOrigin::Inner.as_label(), "inner");
  }
}
