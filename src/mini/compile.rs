//! Folds a typed tree into the pattern algebra.

use fraction::Fraction;

use crate::chord::{self, Modifier};
use crate::event::Event;
use crate::mini::ast::{pattern_size, weighted_children, TPat};
use crate::mini::types::{Enumerable, Parseable};
use crate::pattern::{self, Pattern};
use crate::span::Time;

// -------------------------------------------------------------------------------------------------

/// Phase offset separating the random streams of two parse-time seeds.
fn seed_phase(seed: i32) -> Time {
    Fraction::new(1u64, 10000u64) * Fraction::from(seed)
}

/// Compiles a tree into a sampleable pattern. Pure: the tree is only read,
/// and the result owns everything it needs.
pub fn to_pat<T>(tpat: &TPat<T>) -> Pattern<T>
where
    T: Parseable + Enumerable,
{
    match tpat {
        TPat::Atom { loc: None, value } => pattern::pure(value.clone()),
        TPat::Atom {
            loc: Some(loc),
            value,
        } => pattern::pure(value.clone()).tagged(*loc),
        TPat::Fast(rate, pat) => pattern::fast(to_pat(rate), to_pat(pat)),
        TPat::Slow(rate, pat) => pattern::slow(to_pat(rate), to_pat(pat)),
        TPat::DegradeBy { seed, amount, pat } => pattern::degrade_by_using(
            pattern::rot_left(seed_phase(*seed), pattern::rand()),
            *amount,
            to_pat(pat),
        ),
        TPat::CycleChoose { seed, choices } => {
            let compiled: Vec<Pattern<T>> = choices.iter().map(to_pat).collect();
            pattern::join(pattern::segment(
                Time::from(1),
                pattern::choose_by(
                    pattern::rot_left(seed_phase(*seed), pattern::rand()),
                    compiled,
                ),
            ))
        }
        TPat::Euclid {
            pulses,
            steps,
            rotation,
            pat,
        } => pattern::euclid_with(
            to_pat(pulses),
            to_pat(steps),
            to_pat(rotation),
            to_pat(pat),
            T::euclid_off(),
        ),
        TPat::Stack(pats) => pattern::stack(pats.iter().map(to_pat).collect()),
        TPat::Polyrhythm { step_rate, pats } => {
            let sized: Vec<(Time, Pattern<T>)> = pats
                .iter()
                .map(|p| (pattern_size(p), to_pat(p)))
                .collect();
            let base = sized
                .first()
                .map(|(size, _)| *size)
                .unwrap_or_else(|| Time::from(0));
            let rate: Pattern<Time> = match step_rate {
                Some(r) => to_pat(r),
                None => pattern::pure(base),
            };
            pattern::stack(
                sized
                    .into_iter()
                    .map(|(size, pat)| {
                        if size <= Time::from(0) {
                            pattern::silence()
                        } else {
                            pattern::fast(rate.map(move |r| r / size), pat)
                        }
                    })
                    .collect(),
            )
        }
        TPat::Seq(children) => {
            let weighted = weighted_children(children);
            pattern::timecat(
                weighted
                    .iter()
                    .map(|(weight, child)| (*weight, to_pat(child)))
                    .collect(),
            )
        }
        TPat::Silence => pattern::silence(),
        TPat::Foot => unreachable!("foot markers are resolved during parsing"),
        // weight and repeat markers only mean something as sequence children
        TPat::Elongate { .. } | TPat::Repeat { .. } => pattern::silence(),
        TPat::EnumFromTo(from, to) => pattern::join(pattern::map2(
            to_pat(from),
            to_pat(to),
            |a, b| pattern::fast_from_list(T::from_to(a, b)),
        )),
        TPat::Var(name) => T::control_pattern(name),
        TPat::Chord {
            root,
            name,
            modifiers,
        } => chord_to_pat::<T>(to_pat(root), to_pat(name), to_pat(modifiers)),
    }
}

// -------------------------------------------------------------------------------------------------

/// Expands a chord under a joint binding of its root, name and modifier
/// patterns, then splits the note list back into scalar events. Contexts ride
/// along positionally, so individual chord notes keep per-note provenance
/// where the sources provide it.
fn chord_to_pat<T: Parseable>(
    root: Pattern<f64>,
    name: Pattern<String>,
    modifiers: Pattern<Vec<Modifier>>,
) -> Pattern<T> {
    let expanded: Pattern<Vec<f64>> = Pattern::new(move |state| {
        let mut out = vec![];
        for root_event in root.query(state) {
            for name_event in name.query(&state.with_span(root_event.part)) {
                let Some(part) = root_event.part.intersect(&name_event.part) else {
                    continue;
                };
                let whole = match (root_event.whole, name_event.whole) {
                    (Some(a), Some(b)) => a.intersect(&b),
                    _ => None,
                };
                let mut mods = vec![];
                let mut mods_context = vec![];
                for mod_event in modifiers.query(&state.with_span(part)) {
                    mods.extend(mod_event.value);
                    mods_context.extend(mod_event.context);
                }
                let notes: Vec<f64> = chord::chord_intervals(&name_event.value)
                    .into_iter()
                    .map(|interval| f64::from(interval) + root_event.value)
                    .collect();
                let notes = chord::apply_modifiers(&mods, notes);
                let mut context = root_event.context.clone();
                context.extend(name_event.context.iter().cloned());
                context.extend(mods_context);
                out.push(Event {
                    whole,
                    part,
                    value: notes,
                    context,
                });
            }
        }
        out
    });
    pattern::uncollect(expanded.map(|notes| {
        notes
            .into_iter()
            .filter_map(T::from_semitone)
            .collect::<Vec<T>>()
    }))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::control::{ControlMap, ControlValue};
    use crate::mini::parse_mini;
    use crate::note::Note;
    use crate::pattern::State;
    use crate::span::Span;

    type F = Fraction;

    fn pat<T: Parseable + Enumerable>(input: &str) -> Pattern<T> {
        match parse_mini::<T>(input) {
            Ok(pattern) => pattern,
            Err(err) => panic!("parse failed:\n{}", err),
        }
    }

    fn cycle<T: Parseable + Enumerable>(input: &str) -> Vec<(F, F, T)> {
        triples(&pat::<T>(input).first_cycle())
    }

    fn cycle_at<T: Parseable + Enumerable>(input: &str, n: u64) -> Vec<(F, F, T)> {
        let span = Span::new(F::from(n), F::from(n + 1));
        triples(&pat::<T>(input).events_in(span))
    }

    fn triples<T: Clone>(events: &[Event<T>]) -> Vec<(F, F, T)> {
        events
            .iter()
            .map(|e| (e.part.start, e.part.end, e.value.clone()))
            .collect()
    }

    fn s(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn plain_sequence() {
        assert_eq!(
            cycle::<String>("a b c d"),
            vec![
                (F::from(0), F::new(1u8, 4u8), s("a")),
                (F::new(1u8, 4u8), F::new(1u8, 2u8), s("b")),
                (F::new(1u8, 2u8), F::new(3u8, 4u8), s("c")),
                (F::new(3u8, 4u8), F::from(1), s("d")),
            ]
        );
    }

    #[test]
    fn rests_leave_gaps() {
        assert_eq!(
            cycle::<String>("a ~ b ~"),
            vec![
                (F::from(0), F::new(1u8, 4u8), s("a")),
                (F::new(1u8, 2u8), F::new(3u8, 4u8), s("b")),
            ]
        );
    }

    #[test]
    fn stacked_layers() {
        assert_eq!(
            cycle::<String>("[a b, c d e]"),
            vec![
                (F::from(0), F::new(1u8, 2u8), s("a")),
                (F::new(1u8, 2u8), F::from(1), s("b")),
                (F::from(0), F::new(1u8, 3u8), s("c")),
                (F::new(1u8, 3u8), F::new(2u8, 3u8), s("d")),
                (F::new(2u8, 3u8), F::from(1), s("e")),
            ]
        );
    }

    #[test]
    fn speed_factors() {
        assert_eq!(
            cycle::<String>("a*2"),
            vec![
                (F::from(0), F::new(1u8, 2u8), s("a")),
                (F::new(1u8, 2u8), F::from(1), s("a")),
            ]
        );
        assert_eq!(cycle_at::<String>("[a b]/2", 0), vec![(F::from(0), F::from(1), s("a"))]);
        assert_eq!(
            cycle_at::<String>("[a b]/2", 1),
            vec![(F::from(1), F::from(2), s("b"))]
        );
    }

    #[test]
    fn repeats_and_weights() {
        assert_eq!(
            cycle::<String>("a!3"),
            vec![
                (F::from(0), F::new(1u8, 3u8), s("a")),
                (F::new(1u8, 3u8), F::new(2u8, 3u8), s("a")),
                (F::new(2u8, 3u8), F::from(1), s("a")),
            ]
        );
        assert_eq!(
            cycle::<String>("a@2 b"),
            vec![
                (F::from(0), F::new(2u8, 3u8), s("a")),
                (F::new(2u8, 3u8), F::from(1), s("b")),
            ]
        );
        assert_eq!(cycle::<String>("1!2 3"), cycle::<String>("1 1 3"));
    }

    #[test]
    fn feet_group_evenly() {
        assert_eq!(
            cycle::<String>("[a b . c]"),
            vec![
                (F::from(0), F::new(1u8, 4u8), s("a")),
                (F::new(1u8, 4u8), F::new(1u8, 2u8), s("b")),
                (F::new(1u8, 2u8), F::from(1), s("c")),
            ]
        );
    }

    #[test]
    fn euclidean_rhythms() {
        assert_eq!(
            cycle::<String>("bd(3,8)"),
            vec![
                (F::from(0), F::new(1u8, 8u8), s("bd")),
                (F::new(3u8, 8u8), F::new(4u8, 8u8), s("bd")),
                (F::new(6u8, 8u8), F::new(7u8, 8u8), s("bd")),
            ]
        );
        // the boolean variant keeps off-steps
        let events = pat::<bool>("t(3,8)").first_cycle();
        assert_eq!(events.len(), 8);
        assert_eq!(events.iter().filter(|e| e.value).count(), 3);

        // patterned arguments switch per cycle
        assert_eq!(
            cycle_at::<String>("bd(<3 5>,8)", 1).len(),
            5
        );
    }

    #[test]
    fn enumerations() {
        assert_eq!(
            cycle::<i32>("0 .. 3"),
            vec![
                (F::from(0), F::new(1u8, 4u8), 0),
                (F::new(1u8, 4u8), F::new(1u8, 2u8), 1),
                (F::new(1u8, 2u8), F::new(3u8, 4u8), 2),
                (F::new(3u8, 4u8), F::from(1), 3),
            ]
        );
        assert_eq!(cycle::<i32>("3 .. 0"), cycle::<i32>("3 2 1 0"));
        assert_eq!(cycle::<i32>("0..3"), cycle::<i32>("0 1 2 3"));
        assert_eq!(cycle::<i32>("-5 .. -8"), cycle::<i32>("-5 -6 -7 -8"));
        // non-numeric leaves degenerate to the end points
        assert_eq!(cycle::<String>("a .. d"), cycle::<String>("a d"));
    }

    #[test]
    fn alternation_plays_one_item_per_cycle() {
        for (n, expected) in ["a", "b", "c", "d"].iter().enumerate() {
            assert_eq!(
                cycle_at::<String>("<a b c d>", n as u64),
                vec![(F::from(n as u64), F::from(n as u64 + 1), s(expected))]
            );
        }
        assert_eq!(
            cycle_at::<String>("x <b c>", 1),
            vec![
                (F::from(1), F::new(3u8, 2u8), s("x")),
                (F::new(3u8, 2u8), F::from(2), s("c")),
            ]
        );
    }

    #[test]
    fn polymeters() {
        // the first child's step count sets the rate
        assert_eq!(
            cycle::<String>("{a b c, d e}"),
            vec![
                (F::from(0), F::new(1u8, 3u8), s("a")),
                (F::new(1u8, 3u8), F::new(2u8, 3u8), s("b")),
                (F::new(2u8, 3u8), F::from(1), s("c")),
                (F::from(0), F::new(1u8, 3u8), s("d")),
                (F::new(1u8, 3u8), F::new(2u8, 3u8), s("e")),
                (F::new(2u8, 3u8), F::from(1), s("d")),
            ]
        );
        // the shorter child rolls over into the next cycle
        let second: Vec<String> = cycle_at::<String>("{a b c, d e}", 1)
            .into_iter()
            .map(|(_, _, v)| v)
            .collect();
        assert_eq!(second, vec!["a", "b", "c", "e", "d", "e"]);

        // an explicit rate overrides the first child
        assert_eq!(
            cycle::<String>("{a b c}%4").len(),
            4
        );
        assert_eq!(
            cycle::<String>("a b, {c d e}%2"),
            cycle::<String>("{a b, c d e}")
        );
    }

    #[test]
    fn chords_expand_and_uncollect() {
        assert_eq!(
            cycle::<f64>("c'maj"),
            vec![
                (F::from(0), F::from(1), 0.0),
                (F::from(0), F::from(1), 4.0),
                (F::from(0), F::from(1), 7.0),
            ]
        );
        let events = pat::<f64>("c'maj").first_cycle();
        assert!(events.iter().all(|e| e.whole == Some(Span::unit())));
        // contexts spread positionally: root loc, name loc, then nothing
        assert_eq!(events[0].context.len(), 1);
        assert_eq!(events[1].context.len(), 1);
        assert!(events[2].context.is_empty());

        assert_eq!(cycle::<f64>("c5'maj"), cycle::<f64>("c'maj"));
        assert_eq!(
            cycle::<f64>("c4'maj"),
            vec![
                (F::from(0), F::from(1), -12.0),
                (F::from(0), F::from(1), -8.0),
                (F::from(0), F::from(1), -5.0),
            ]
        );
        assert_eq!(
            cycle::<Note>("e'min"),
            vec![
                (F::from(0), F::from(1), Note(4.0)),
                (F::from(0), F::from(1), Note(7.0)),
                (F::from(0), F::from(1), Note(11.0)),
            ]
        );
        // unknown names fall back to the bare root
        assert_eq!(cycle::<f64>("c'qwe"), vec![(F::from(0), F::from(1), 0.0)]);
    }

    #[test]
    fn chord_modifiers_apply_in_order() {
        assert_eq!(
            cycle::<f64>("c'maj'i"),
            vec![
                (F::from(0), F::from(1), 4.0),
                (F::from(0), F::from(1), 7.0),
                (F::from(0), F::from(1), 12.0),
            ]
        );
        assert_eq!(
            cycle::<f64>("c'maj'5"),
            vec![
                (F::from(0), F::from(1), 0.0),
                (F::from(0), F::from(1), 4.0),
                (F::from(0), F::from(1), 7.0),
                (F::from(0), F::from(1), 12.0),
                (F::from(0), F::from(1), 16.0),
            ]
        );
        assert_eq!(
            cycle::<f64>("c'maj'i'o"),
            vec![
                (F::from(0), F::from(1), -8.0),
                (F::from(0), F::from(1), 0.0),
                (F::from(0), F::from(1), 7.0),
            ]
        );
        assert_eq!(cycle::<f64>("c'maj'd1").last().map(|t| t.2), Some(-5.0));
    }

    #[test]
    fn degrade_is_deterministic() {
        let p = pat::<String>("[a b c d e f g h]*2?");
        let first = p.first_cycle();
        assert_eq!(first, p.first_cycle());
        assert_eq!(first, pat::<String>("[a b c d e f g h]*2?").first_cycle());
        assert!(first.len() <= 16);

        // everything survives a zero chance, nothing survives certainty
        assert_eq!(pat::<String>("[a b c d]?0").first_cycle().len(), 4);
        assert!(pat::<String>("[a b c d]?1").first_cycle().is_empty());
    }

    #[test]
    fn cycle_choice_is_deterministic_per_cycle() {
        let p = pat::<String>("[bd|sn|hh]");
        for n in 0..8u64 {
            let span = Span::new(F::from(n), F::from(n + 1));
            let events = p.events_in(span);
            assert_eq!(events.len(), 1);
            assert_eq!(events, p.events_in(span));
            assert!(["bd", "sn", "hh"].contains(&events[0].value.as_str()));
        }
    }

    #[test]
    fn variables_read_controls() {
        let mut controls = ControlMap::new();
        controls.set("gain", ControlValue::Float(0.8));
        let p = pat::<f64>("^gain");
        let events = p.query(&State::new(Span::unit(), controls));
        assert_eq!(triples(&events), vec![(F::from(0), F::from(1), 0.8)]);
        assert!(p.first_cycle().is_empty());

        // types without channels stay silent
        let mut controls = ControlMap::new();
        controls.set("x", ControlValue::Int(1));
        let p = pat::<char>("^x");
        assert!(p.query(&State::new(Span::unit(), controls)).is_empty());
    }

    #[test]
    fn other_leaf_types() {
        assert_eq!(
            cycle::<F>("1q 3%4 0.5"),
            vec![
                (F::from(0), F::new(1u8, 3u8), F::new(1u64, 4u64)),
                (F::new(1u8, 3u8), F::new(2u8, 3u8), F::new(3u64, 4u64)),
                (F::new(2u8, 3u8), F::from(1), F::new(1u64, 2u64)),
            ]
        );
        assert_eq!(
            cycle::<char>("a 1"),
            vec![
                (F::from(0), F::new(1u8, 2u8), 'a'),
                (F::new(1u8, 2u8), F::from(1), '1'),
            ]
        );
        let colors = cycle::<crate::color::Color>("red blue");
        assert_eq!(colors.len(), 2);
        assert_eq!(
            cycle::<bool>("t f 1 0"),
            vec![
                (F::from(0), F::new(1u8, 4u8), true),
                (F::new(1u8, 4u8), F::new(1u8, 2u8), false),
                (F::new(1u8, 2u8), F::new(3u8, 4u8), true),
                (F::new(3u8, 4u8), F::from(1), false),
            ]
        );
        assert_eq!(
            cycle::<Note>("c e g"),
            vec![
                (F::from(0), F::new(1u8, 3u8), Note(0.0)),
                (F::new(1u8, 3u8), F::new(2u8, 3u8), Note(4.0)),
                (F::new(2u8, 3u8), F::from(1), Note(7.0)),
            ]
        );
        assert_eq!(cycle::<i64>("1 -2 3.0").len(), 3);
    }

    #[test]
    fn atoms_tag_their_events() {
        let events = pat::<String>("bd sn").first_cycle();
        assert_eq!(
            events[0].context,
            vec![crate::event::SourceSpan::new((1, 1), (3, 1))]
        );
        assert_eq!(
            events[1].context,
            vec![crate::event::SourceSpan::new((4, 1), (6, 1))]
        );
    }

    #[test]
    fn detached_markers_compile_to_silence() {
        let weight = TPat::Elongate {
            weight: Fraction::from(2),
            pat: Box::new(TPat::atom(s("a"))),
        };
        assert!(to_pat(&weight).first_cycle().is_empty());
        let repeat = TPat::Repeat {
            count: 2,
            pat: Box::new(TPat::atom(s("a"))),
        };
        assert!(to_pat(&repeat).first_cycle().is_empty());
    }

    #[test]
    fn sampling_is_finite_and_pure() {
        let inputs = [
            "a b c d",
            "[a b, c d e] {f g}%3 <h i>",
            "bd(3,8,1)? sn*4 [x|y]",
            "0 .. 7",
        ];
        for input in inputs {
            let p = pat::<String>(input);
            let events = p.first_cycle();
            assert_eq!(events, p.first_cycle(), "'{}' must sample purely", input);
        }
    }
}
