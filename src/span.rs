//! Rational time spans over the cycle timeline.

use fraction::{Fraction, One, Zero};

// -------------------------------------------------------------------------------------------------

/// Time is an exact rational number of cycles. All durations in the core are rational;
/// floating point only ever appears in leaf values, never in time arithmetic.
pub type Time = Fraction;

/// Start of the cycle containing `t` (the greatest whole cycle number not above `t`).
pub fn sam(t: Time) -> Time {
    let f = t.floor();
    if f > t {
        f - Time::one()
    } else {
        f
    }
}

/// Position of `t` within its cycle, in `0..1`.
pub fn cycle_pos(t: Time) -> Time {
    t - sam(t)
}

// -------------------------------------------------------------------------------------------------

/// A half-open time interval `start..end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub start: Time,
    pub end: Time,
}

impl Span {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    /// The whole first cycle, `0..1`.
    pub fn unit() -> Self {
        Self::new(Time::zero(), Time::one())
    }

    /// A zero-width span, used to sample signals at an instant.
    pub fn instant(t: Time) -> Self {
        Self::new(t, t)
    }

    pub fn length(&self) -> Time {
        self.end - self.start
    }

    pub fn midpoint(&self) -> Time {
        self.start + self.length() / Time::from(2)
    }

    /// Maps both end points.
    pub fn map_points<F>(&self, f: F) -> Span
    where
        F: Fn(Time) -> Time,
    {
        Span::new(f(self.start), f(self.end))
    }

    /// Splits the span at cycle boundaries. Each returned piece lies within a
    /// single cycle; zero-width spans yield nothing.
    pub fn cycles(&self) -> Vec<Span> {
        let mut out = vec![];
        let mut start = self.start;
        while start < self.end {
            let next = sam(start) + Time::one();
            let end = if next < self.end { next } else { self.end };
            out.push(Span::new(start, end));
            start = next;
        }
        out
    }

    /// The cycle number of the span's start point.
    pub fn start_cycle(&self) -> Time {
        sam(self.start)
    }

    /// Overlap of two spans, when there is one. Zero-width overlaps count only
    /// when one of the spans is itself zero-width at that point, so adjacent
    /// intervals do not intersect.
    pub fn intersect(&self, other: &Span) -> Option<Span> {
        let start = if self.start > other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end < other.end {
            self.end
        } else {
            other.end
        };
        if start > end {
            return None;
        }
        if start == end {
            let touches_point = self.start == self.end || other.start == other.end;
            if !touches_point {
                return None;
            }
        }
        Some(Span::new(start, end))
    }

    pub fn contains(&self, t: Time) -> bool {
        self.start <= t && t < self.end
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    type F = Fraction;

    #[test]
    fn sam_and_pos() {
        assert_eq!(sam(F::new(3u8, 2u8)), F::from(1));
        assert_eq!(sam(F::from(2)), F::from(2));
        assert_eq!(sam(-F::new(1u8, 2u8)), F::from(-1));
        assert_eq!(cycle_pos(F::new(5u8, 4u8)), F::new(1u8, 4u8));
    }

    #[test]
    fn cycle_split() {
        let span = Span::new(F::new(1u8, 2u8), F::new(5u8, 2u8));
        assert_eq!(
            span.cycles(),
            vec![
                Span::new(F::new(1u8, 2u8), F::from(1)),
                Span::new(F::from(1), F::from(2)),
                Span::new(F::from(2), F::new(5u8, 2u8)),
            ]
        );
        assert!(Span::instant(F::from(1)).cycles().is_empty());
    }

    #[test]
    fn intersection() {
        let a = Span::new(F::from(0), F::from(1));
        let b = Span::new(F::new(1u8, 2u8), F::from(2));
        assert_eq!(
            a.intersect(&b),
            Some(Span::new(F::new(1u8, 2u8), F::from(1)))
        );
        // adjacent spans don't overlap
        let c = Span::new(F::from(1), F::from(2));
        assert_eq!(a.intersect(&c), None);
        // but sampling instants do
        let p = Span::instant(F::new(1u8, 2u8));
        assert_eq!(a.intersect(&p), Some(p));
    }
}
