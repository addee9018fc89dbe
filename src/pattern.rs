//! Query-based pattern algebra over rational cycle time.
//!
//! A [`Pattern`] is a pure function from a sampling [`State`] (a time span
//! plus the current control map) to a finite list of [`Event`]s. Everything
//! here is a value: combinators wrap queries in new queries, and the same
//! pattern can be sampled from any number of threads.

use std::fmt;
use std::sync::Arc;

use fraction::{One, ToPrimitive, Zero};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::control::ControlMap;
use crate::event::{Event, SourceSpan};
use crate::span::{sam, Span, Time};

pub mod euclidean;

// -------------------------------------------------------------------------------------------------

/// Bounds required of event values carried by a pattern.
pub trait Value: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> Value for T {}

/// One query: the span to sample and the named control channels visible to it.
#[derive(Clone, Debug)]
pub struct State {
    pub span: Span,
    pub controls: ControlMap,
}

impl State {
    pub fn new(span: Span, controls: ControlMap) -> Self {
        Self { span, controls }
    }

    pub fn with_span(&self, span: Span) -> Self {
        Self {
            span,
            controls: self.controls.clone(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A pure function from a time span to the events audible within it.
pub struct Pattern<T> {
    query: Arc<dyn Fn(&State) -> Vec<Event<T>> + Send + Sync>,
}

impl<T> Clone for Pattern<T> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
        }
    }
}

impl<T> fmt::Debug for Pattern<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pattern")
    }
}

impl<T: Value> Pattern<T> {
    pub fn new<F>(query: F) -> Self
    where
        F: Fn(&State) -> Vec<Event<T>> + Send + Sync + 'static,
    {
        Self {
            query: Arc::new(query),
        }
    }

    pub fn query(&self, state: &State) -> Vec<Event<T>> {
        (self.query)(state)
    }

    /// Queries the span with an empty control map.
    pub fn events_in(&self, span: Span) -> Vec<Event<T>> {
        self.query(&State::new(span, ControlMap::new()))
    }

    /// Events of the first cycle, `0..1`.
    pub fn first_cycle(&self) -> Vec<Event<T>> {
        self.events_in(Span::unit())
    }

    pub fn map<U, F>(&self, f: F) -> Pattern<U>
    where
        U: Value,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let p = self.clone();
        Pattern::new(move |state| p.query(state).into_iter().map(|e| e.map(&f)).collect())
    }

    pub fn filter_events<F>(&self, keep: F) -> Pattern<T>
    where
        F: Fn(&Event<T>) -> bool + Send + Sync + 'static,
    {
        let p = self.clone();
        Pattern::new(move |state| p.query(state).into_iter().filter(|e| keep(e)).collect())
    }

    /// Rewrites whole query results at once.
    pub fn with_events<U, F>(&self, f: F) -> Pattern<U>
    where
        U: Value,
        F: Fn(Vec<Event<T>>) -> Vec<Event<U>> + Send + Sync + 'static,
    {
        let p = self.clone();
        Pattern::new(move |state| f(p.query(state)))
    }

    /// Appends a source location to every emitted event's context.
    pub fn tagged(&self, loc: SourceSpan) -> Pattern<T> {
        self.with_events(move |events| {
            events
                .into_iter()
                .map(|mut e| {
                    e.context.push(loc);
                    e
                })
                .collect()
        })
    }

    fn with_query_time<F>(&self, f: F) -> Pattern<T>
    where
        F: Fn(Time) -> Time + Send + Sync + 'static,
    {
        let p = self.clone();
        Pattern::new(move |state| p.query(&state.with_span(state.span.map_points(&f))))
    }

    fn with_event_time<F>(&self, f: F) -> Pattern<T>
    where
        F: Fn(Time) -> Time + Send + Sync + 'static,
    {
        let p = self.clone();
        Pattern::new(move |state| {
            p.query(state)
                .into_iter()
                .map(|e| e.map_points(&f))
                .collect()
        })
    }
}

// -------------------------------------------------------------------------------------------------

/// Repeats the value once per cycle.
pub fn pure<T: Value>(value: T) -> Pattern<T> {
    Pattern::new(move |state| {
        state
            .span
            .cycles()
            .into_iter()
            .map(|part| {
                let start = sam(part.start);
                let whole = Span::new(start, start + Time::one());
                Event::new(Some(whole), part, value.clone())
            })
            .collect()
    })
}

/// The empty pattern.
pub fn silence<T: Value>() -> Pattern<T> {
    Pattern::new(|_| vec![])
}

/// A continuous pattern sampled at the midpoint of each query span. Signal
/// events carry no `whole`.
pub fn signal<T, F>(f: F) -> Pattern<T>
where
    T: Value,
    F: Fn(Time) -> T + Send + Sync + 'static,
{
    Pattern::new(move |state| vec![Event::new(None, state.span, f(state.span.midpoint()))])
}

/// Deterministic uniform noise in `[0, 1)`. The sample time alone decides the
/// value, so any two queries of the same point agree.
pub fn rand() -> Pattern<f64> {
    signal(time_to_rand)
}

/// Hashes a rational time point into `[0, 1)`.
pub fn time_to_rand(t: Time) -> f64 {
    let bits = t.to_f64().unwrap_or_default().to_bits();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(bits);
    rng.gen::<f64>()
}

// -------------------------------------------------------------------------------------------------

/// Layers patterns on top of each other; a query concatenates all layers'
/// events.
pub fn stack<T: Value>(patterns: Vec<Pattern<T>>) -> Pattern<T> {
    Pattern::new(move |state| patterns.iter().flat_map(|p| p.query(state)).collect())
}

/// Concatenates patterns within a single cycle, each child weighted by the
/// given share of the cycle. One cycle of each child is squeezed into its
/// window, so nested structure survives.
pub fn timecat<T: Value>(pairs: Vec<(Time, Pattern<T>)>) -> Pattern<T> {
    let total = pairs
        .iter()
        .fold(Time::zero(), |acc, (weight, _)| acc + *weight);
    if pairs.is_empty() || total <= Time::zero() {
        return silence();
    }
    let mut windows = Vec::with_capacity(pairs.len());
    let mut start = Time::zero();
    for (weight, pattern) in pairs {
        let end = start + weight / total;
        windows.push((Span::new(start, end), pattern));
        start = end;
    }
    Pattern::new(move |state| {
        let mut out = vec![];
        for slice in state.span.cycles() {
            let cycle = sam(slice.start);
            for (window, pattern) in &windows {
                let abs = window.map_points(|t| t + cycle);
                if let Some(sect) = slice.intersect(&abs) {
                    out.extend(compress_into(&abs, pattern, &state.with_span(sect)));
                }
            }
        }
        out
    })
}

/// Queries one cycle of `pattern` as if it filled `window`; the query state's
/// span must lie within the window.
fn compress_into<T: Value>(window: &Span, pattern: &Pattern<T>, state: &State) -> Vec<Event<T>> {
    let length = window.length();
    if length <= Time::zero() {
        return vec![];
    }
    let cycle = sam(window.start);
    let start = window.start;
    let inner = state.span.map_points(|t| cycle + (t - start) / length);
    pattern
        .query(&state.with_span(inner))
        .into_iter()
        .map(|e| e.map_points(|u| start + (u - cycle) * length))
        .collect()
}

/// Concatenates patterns into one cycle with equal weights.
pub fn fastcat<T: Value>(patterns: Vec<Pattern<T>>) -> Pattern<T> {
    timecat(patterns.into_iter().map(|p| (Time::one(), p)).collect())
}

/// One cycle holding each value once, in order.
pub fn fast_from_list<T: Value>(values: Vec<T>) -> Pattern<T> {
    fastcat(values.into_iter().map(pure).collect())
}

// -------------------------------------------------------------------------------------------------

/// Speeds the pattern up by a plain rational factor. Factors of zero or less
/// give silence.
pub fn fast_by<T: Value>(rate: Time, pattern: Pattern<T>) -> Pattern<T> {
    if rate <= Time::zero() {
        return silence();
    }
    pattern
        .with_query_time(move |t| t * rate)
        .with_event_time(move |t| t / rate)
}

/// Slows the pattern down by a plain rational factor.
pub fn slow_by<T: Value>(rate: Time, pattern: Pattern<T>) -> Pattern<T> {
    if rate <= Time::zero() {
        return silence();
    }
    fast_by(Time::one() / rate, pattern)
}

/// Speeds the pattern up by a patterned factor; the factor pattern supplies
/// the sampling structure via an inner join.
pub fn fast<T: Value>(rate: Pattern<Time>, pattern: Pattern<T>) -> Pattern<T> {
    inner_join(rate.map(move |r| fast_by(r, pattern.clone())))
}

/// Slows the pattern down by a patterned factor.
pub fn slow<T: Value>(rate: Pattern<Time>, pattern: Pattern<T>) -> Pattern<T> {
    inner_join(rate.map(move |r| slow_by(r, pattern.clone())))
}

/// Rotates the pattern earlier in time: what played at `amount` now plays at 0.
pub fn rot_left<T: Value>(amount: Time, pattern: Pattern<T>) -> Pattern<T> {
    pattern
        .with_query_time(move |t| t + amount)
        .with_event_time(move |t| t - amount)
}

/// Rotates the pattern later in time.
pub fn rot_right<T: Value>(amount: Time, pattern: Pattern<T>) -> Pattern<T> {
    pattern
        .with_query_time(move |t| t - amount)
        .with_event_time(move |t| t + amount)
}

/// Samples the pattern into `n` equal discrete steps per cycle. Useful for
/// freezing continuous signals into events.
pub fn segment<T: Value>(n: Time, pattern: Pattern<T>) -> Pattern<T> {
    let steps = fast_by(n, pure(()));
    Pattern::new(move |state| {
        let mut out = vec![];
        for step in steps.query(state) {
            let probe = state.with_span(step.whole_or_part());
            for e in pattern.query(&probe) {
                out.push(Event {
                    whole: step.whole,
                    part: step.part,
                    value: e.value,
                    context: e.context,
                });
            }
        }
        out
    })
}

/// Maps a noise pattern onto a list of choices.
pub fn choose_by<T: Value>(noise: Pattern<f64>, choices: Vec<T>) -> Pattern<T> {
    if choices.is_empty() {
        return silence();
    }
    noise.map(move |r| {
        let ix = ((r * choices.len() as f64).floor() as usize).min(choices.len() - 1);
        choices[ix].clone()
    })
}

/// Drops events whose sampled noise value falls below `amount`. With the
/// default noise source this removes roughly `amount` of all events,
/// deterministically per time point.
pub fn degrade_by_using<T: Value>(
    noise: Pattern<f64>,
    amount: f64,
    pattern: Pattern<T>,
) -> Pattern<T> {
    Pattern::new(move |state| {
        pattern
            .query(state)
            .into_iter()
            .filter(|e| {
                let probe = state.with_span(e.whole_or_part());
                noise
                    .query(&probe)
                    .first()
                    .map_or(false, |r| r.value >= amount)
            })
            .collect()
    })
}

// -------------------------------------------------------------------------------------------------

/// Pairs up events from two patterns wherever their parts overlap. The
/// result's `whole` is the intersection of both wholes (`None` if either side
/// is continuous) and contexts are concatenated.
pub fn map2<A, B, C, F>(pa: Pattern<A>, pb: Pattern<B>, f: F) -> Pattern<C>
where
    A: Value,
    B: Value,
    C: Value,
    F: Fn(A, B) -> C + Send + Sync + 'static,
{
    Pattern::new(move |state| {
        let bs = pb.query(state);
        let mut out = vec![];
        for ea in pa.query(state) {
            for eb in &bs {
                let Some(part) = ea.part.intersect(&eb.part) else {
                    continue;
                };
                let whole = match (ea.whole, eb.whole) {
                    (Some(wa), Some(wb)) => wa.intersect(&wb),
                    _ => None,
                };
                let mut context = ea.context.clone();
                context.extend(eb.context.iter().cloned());
                out.push(Event {
                    whole,
                    part,
                    value: f(ea.value.clone(), eb.value.clone()),
                    context,
                });
            }
        }
        out
    })
}

/// Three-way [`map2`].
pub fn map3<A, B, C, D, F>(pa: Pattern<A>, pb: Pattern<B>, pc: Pattern<C>, f: F) -> Pattern<D>
where
    A: Value,
    B: Value,
    C: Value,
    D: Value,
    F: Fn(A, B, C) -> D + Send + Sync + 'static,
{
    map2(map2(pa, pb, |a, b| (a, b)), pc, move |(a, b), c| f(a, b, c))
}

/// Flattens a pattern of patterns. Structure comes from both levels: an
/// event survives only where its outer and inner extents overlap.
pub fn join<T: Value>(outer: Pattern<Pattern<T>>) -> Pattern<T> {
    Pattern::new(move |state| {
        let mut out = vec![];
        for oe in outer.query(state) {
            for ie in oe.value.query(&state.with_span(oe.part)) {
                let Some(part) = ie.part.intersect(&oe.part) else {
                    continue;
                };
                let whole = match (oe.whole, ie.whole) {
                    (Some(ow), Some(iw)) => match ow.intersect(&iw) {
                        Some(w) => Some(w),
                        None => continue,
                    },
                    _ => None,
                };
                let mut context = oe.context.clone();
                context.extend(ie.context.iter().cloned());
                out.push(Event {
                    whole,
                    part,
                    value: ie.value.clone(),
                    context,
                });
            }
        }
        out
    })
}

/// Flattens a pattern of patterns, keeping only the inner patterns'
/// structure; the outer pattern just decides which inner pattern is active.
pub fn inner_join<T: Value>(outer: Pattern<Pattern<T>>) -> Pattern<T> {
    Pattern::new(move |state| {
        let mut out = vec![];
        for oe in outer.query(state) {
            for ie in oe.value.query(&state.with_span(oe.part)) {
                let Some(part) = ie.part.intersect(&state.span) else {
                    continue;
                };
                let mut context = oe.context.clone();
                context.extend(ie.context.iter().cloned());
                out.push(Event {
                    whole: ie.whole,
                    part,
                    value: ie.value.clone(),
                    context,
                });
            }
        }
        out
    })
}

// -------------------------------------------------------------------------------------------------

/// Euclidean rhythm with patterned pulse, step and rotation counts; off-steps
/// play the `off` pattern (silence for most leaf types, `false` for booleans).
pub fn euclid_with<T: Value>(
    pulses: Pattern<i32>,
    steps: Pattern<i32>,
    rotation: Pattern<i32>,
    pattern: Pattern<T>,
    off: Pattern<T>,
) -> Pattern<T> {
    let args = map3(pulses, steps, rotation, |n, k, r| (n, k, r));
    inner_join(args.map(move |(n, k, r)| step_euclid(n, k, r, pattern.clone(), off.clone())))
}

/// Euclidean rhythm with silent off-steps.
pub fn euclid<T: Value>(
    pulses: Pattern<i32>,
    steps: Pattern<i32>,
    rotation: Pattern<i32>,
    pattern: Pattern<T>,
) -> Pattern<T> {
    euclid_with(pulses, steps, rotation, pattern, silence())
}

fn step_euclid<T: Value>(
    pulses: i32,
    steps: i32,
    rotation: i32,
    pattern: Pattern<T>,
    off: Pattern<T>,
) -> Pattern<T> {
    if steps <= 0 {
        return silence();
    }
    let mask = euclidean::euclidean(pulses.max(0) as u32, steps as u32, rotation);
    fastcat(
        mask.into_iter()
            .map(|on| if on { pattern.clone() } else { off.clone() })
            .collect(),
    )
}

// -------------------------------------------------------------------------------------------------

/// Groups events sharing a slot (same `whole` and `part`) into one
/// list-valued event. Values keep first-occurrence order and contexts are
/// concatenated.
pub fn collect<T: Value>(pattern: Pattern<T>) -> Pattern<Vec<T>> {
    collect_by(pattern, |a, b| a.same_slot(b))
}

/// [`collect`] under a caller-chosen equivalence on events.
pub fn collect_by<T, F>(pattern: Pattern<T>, same: F) -> Pattern<Vec<T>>
where
    T: Value,
    F: Fn(&Event<T>, &Event<T>) -> bool + Send + Sync + 'static,
{
    pattern.with_events(move |events| {
        let mut reps: Vec<Event<T>> = vec![];
        let mut groups: Vec<Event<Vec<T>>> = vec![];
        for e in events {
            if let Some(ix) = reps.iter().position(|r| same(r, &e)) {
                groups[ix].value.push(e.value);
                groups[ix].context.extend(e.context);
            } else {
                groups.push(Event {
                    whole: e.whole,
                    part: e.part,
                    value: vec![e.value.clone()],
                    context: e.context.clone(),
                });
                reps.push(e);
            }
        }
        groups
    })
}

/// Splits list-valued events back into scalars sharing the slot. Contexts are
/// dealt out positionally: the i-th value takes the i-th source location, and
/// values beyond the context list get none.
pub fn uncollect<T: Value>(pattern: Pattern<Vec<T>>) -> Pattern<T> {
    pattern.with_events(|events| {
        let mut out = vec![];
        for e in events {
            for (i, value) in e.value.iter().enumerate() {
                out.push(Event {
                    whole: e.whole,
                    part: e.part,
                    value: value.clone(),
                    context: e.context.get(i).map(|c| vec![*c]).unwrap_or_default(),
                });
            }
        }
        out
    })
}

// -------------------------------------------------------------------------------------------------
