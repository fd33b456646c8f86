//! The signals a stream can carry.
//!
//! A stream emits zero or more [`Event::Next`] values followed by exactly one
//! terminal event. [`Terminal`] is the terminal half of [`Event`] on its own,
//! which is what observers receive in [`Observer::terminate`].
//!
//! [`Observer::terminate`]: crate::observer::Observer::terminate

use std::fmt::{Debug, Formatter};

/// One signal of a stream.
#[derive(Clone, PartialEq, Eq)]
pub enum Event<Item, Err> {
  /// A value.
  Next(Item),
  /// The stream finished normally.
  Completed,
  /// The stream failed with an error.
  Failed(Err),
  /// The stream was cancelled by its consumer before it finished.
  Interrupted,
}

/// How a stream ended.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Terminal<Err> {
  Completed,
  Failed(Err),
  Interrupted,
}

impl<Item, Err> Event<Item, Err> {
  /// Returns `true` for `Completed`, `Failed` and `Interrupted`.
  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Event::Next(_)) }

  /// Splits the event into its value or its terminal part.
  pub fn into_terminal(self) -> Result<Terminal<Err>, Item> {
    match self {
      Event::Next(v) => Err(v),
      Event::Completed => Ok(Terminal::Completed),
      Event::Failed(err) => Ok(Terminal::Failed(err)),
      Event::Interrupted => Ok(Terminal::Interrupted),
    }
  }
}

impl<Item, Err> From<Terminal<Err>> for Event<Item, Err> {
  fn from(terminal: Terminal<Err>) -> Self {
    match terminal {
      Terminal::Completed => Event::Completed,
      Terminal::Failed(err) => Event::Failed(err),
      Terminal::Interrupted => Event::Interrupted,
    }
  }
}

impl<Err> Terminal<Err> {
  #[inline]
  pub fn is_completed(&self) -> bool { matches!(self, Terminal::Completed) }

  #[inline]
  pub fn is_failed(&self) -> bool { matches!(self, Terminal::Failed(_)) }

  #[inline]
  pub fn is_interrupted(&self) -> bool { matches!(self, Terminal::Interrupted) }

  /// Short stable label, used in log fields.
  pub fn as_label(&self) -> &'static str {
    match self {
      Terminal::Completed => "completed",
      Terminal::Failed(_) => "failed",
      Terminal::Interrupted => "interrupted",
    }
  }
}

impl<Item: Debug, Err: Debug> Debug for Event<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Event::Next(v) => f.debug_tuple("Next").field(v).finish(),
      Event::Completed => f.write_str("Completed"),
      Event::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
      Event::Interrupted => f.write_str("Interrupted"),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn split_terminal() {
    let next: Event<i32, ()> = Event::Next(1);
    assert!(!next.is_terminal());
    assert_eq!(next.into_terminal(), Err(1));

    let failed: Event<i32, &str> = Event::Failed("boom");
    assert!(failed.is_terminal());
    assert_eq!(failed.into_terminal(), Ok(Terminal::Failed("boom")));
  }

  #[test]
  fn terminal_back_into_event() {
    let e: Event<(), ()> = Terminal::Interrupted.into();
    assert_eq!(e, Event::Interrupted);
    assert_eq!(Terminal::<()>::Completed.as_label(), "completed");
  }
}
