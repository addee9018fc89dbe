//! Timed events produced by querying a `Pattern`.

use std::fmt::{self, Display};

use crate::span::{Span, Time};

// -------------------------------------------------------------------------------------------------

/// Region of the source text an atom was parsed from: begin and end as
/// `(column, line)` pairs, both 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub begin: (usize, usize),
    pub end: (usize, usize),
}

impl SourceSpan {
    pub fn new(begin: (usize, usize), end: (usize, usize)) -> Self {
        Self { begin, end }
    }
}

// -------------------------------------------------------------------------------------------------

/// A value placed in time.
///
/// `whole` is the event's logical extent; `part` the sub-slice visible in the
/// sampled window. Signal-derived events have no `whole`. `context` collects
/// the source locations the value originates from, so editors can highlight
/// the text span that produced a sounding event.
#[derive(Clone, Debug, PartialEq)]
pub struct Event<T> {
    pub whole: Option<Span>,
    pub part: Span,
    pub value: T,
    pub context: Vec<SourceSpan>,
}

impl<T> Event<T> {
    pub fn new(whole: Option<Span>, part: Span, value: T) -> Self {
        Self {
            whole,
            part,
            value,
            context: vec![],
        }
    }

    pub fn with_context(mut self, context: Vec<SourceSpan>) -> Self {
        self.context = context;
        self
    }

    /// The logical extent, falling back to the visible part for signals.
    pub fn whole_or_part(&self) -> Span {
        self.whole.unwrap_or(self.part)
    }

    /// True when the event begins at its visible part (it is not a tail
    /// fragment of an event that started before the sampled window).
    pub fn has_onset(&self) -> bool {
        match self.whole {
            Some(whole) => whole.start == self.part.start,
            None => false,
        }
    }

    pub fn map<U, F>(self, f: F) -> Event<U>
    where
        F: FnOnce(T) -> U,
    {
        Event {
            whole: self.whole,
            part: self.part,
            value: f(self.value),
            context: self.context,
        }
    }

    pub fn map_points<F>(mut self, f: F) -> Event<T>
    where
        F: Fn(Time) -> Time,
    {
        self.whole = self.whole.map(|w| w.map_points(&f));
        self.part = self.part.map_points(&f);
        self
    }

    /// The grouping key used by `collect`: two events share a slot when both
    /// `whole` and `part` coincide.
    pub fn same_slot(&self, other: &Event<T>) -> bool {
        self.whole == other.whole && self.part == other.part
    }
}

impl<T: Display> Display for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} | {}", self.part.start, self.part.end, self.value)
    }
}

// -------------------------------------------------------------------------------------------------
