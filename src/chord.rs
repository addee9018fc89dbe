//! Chord name dictionary and voicing modifiers.

use lazy_static::lazy_static;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------

// major chords
const MAJOR: [i32; 3] = [0, 4, 7];
const AUG: [i32; 3] = [0, 4, 8];
const SIX: [i32; 4] = [0, 4, 7, 9];
const SIX_NINE: [i32; 5] = [0, 4, 7, 9, 14];
const MAJOR7: [i32; 4] = [0, 4, 7, 11];
const MAJOR9: [i32; 5] = [0, 4, 7, 11, 14];
const ADD9: [i32; 4] = [0, 4, 7, 14];
const MAJOR11: [i32; 6] = [0, 4, 7, 11, 14, 17];
const ADD11: [i32; 4] = [0, 4, 7, 17];
const MAJOR13: [i32; 6] = [0, 4, 7, 11, 14, 21];
const ADD13: [i32; 4] = [0, 4, 7, 21];
// dominant chords
const DOM7: [i32; 4] = [0, 4, 7, 10];
const DOM9: [i32; 4] = [0, 4, 7, 14];
const DOM11: [i32; 4] = [0, 4, 7, 17];
const DOM13: [i32; 4] = [0, 4, 7, 21];
const SEVEN_FLAT5: [i32; 4] = [0, 4, 6, 10];
const SEVEN_SHARP5: [i32; 4] = [0, 4, 8, 10];
const SEVEN_FLAT9: [i32; 5] = [0, 4, 7, 10, 13];
const NINE: [i32; 5] = [0, 4, 7, 10, 14];
const ELEVEN: [i32; 6] = [0, 4, 7, 10, 14, 17];
const THIRTEEN: [i32; 7] = [0, 4, 7, 10, 14, 17, 21];
// minor chords
const MINOR: [i32; 3] = [0, 3, 7];
const DIMINISHED: [i32; 3] = [0, 3, 6];
const MINOR6: [i32; 4] = [0, 3, 7, 9];
const MINOR7FLAT5: [i32; 4] = [0, 3, 6, 10];
const MINOR7: [i32; 4] = [0, 3, 7, 10];
const DIMINISHED7: [i32; 4] = [0, 3, 6, 9];
const MINOR9: [i32; 5] = [0, 3, 7, 10, 14];
const MINOR11: [i32; 6] = [0, 3, 7, 10, 14, 17];
const MINOR13: [i32; 7] = [0, 3, 7, 10, 14, 17, 21];
const MINOR_MAJOR7: [i32; 4] = [0, 3, 7, 11];
// other chords
const ONE: [i32; 1] = [0];
const FIVE: [i32; 2] = [0, 7];
const SUS2: [i32; 3] = [0, 2, 7];
const SUS4: [i32; 3] = [0, 5, 7];
const SEVEN_SUS2: [i32; 4] = [0, 2, 7, 10];
const SEVEN_SUS4: [i32; 4] = [0, 5, 7, 10];
const NINE_SUS4: [i32; 5] = [0, 5, 7, 10, 14];

// map of all known chords with various aliases
lazy_static! {
    static ref CHORD_TABLE: HashMap<&'static str, Vec<i32>> = {
        HashMap::from([
            ("major", Vec::from(MAJOR)),
            ("maj", Vec::from(MAJOR)),
            ("M", Vec::from(MAJOR)),
            ("augmented", Vec::from(AUG)),
            ("aug", Vec::from(AUG)),
            ("plus", Vec::from(AUG)),
            ("six", Vec::from(SIX)),
            ("6", Vec::from(SIX)),
            ("sixNine", Vec::from(SIX_NINE)),
            ("six9", Vec::from(SIX_NINE)),
            ("69", Vec::from(SIX_NINE)),
            ("major7", Vec::from(MAJOR7)),
            ("maj7", Vec::from(MAJOR7)),
            ("M7", Vec::from(MAJOR7)),
            ("major9", Vec::from(MAJOR9)),
            ("maj9", Vec::from(MAJOR9)),
            ("M9", Vec::from(MAJOR9)),
            ("add9", Vec::from(ADD9)),
            ("major11", Vec::from(MAJOR11)),
            ("maj11", Vec::from(MAJOR11)),
            ("M11", Vec::from(MAJOR11)),
            ("add11", Vec::from(ADD11)),
            ("major13", Vec::from(MAJOR13)),
            ("maj13", Vec::from(MAJOR13)),
            ("M13", Vec::from(MAJOR13)),
            ("add13", Vec::from(ADD13)),
            ("dom7", Vec::from(DOM7)),
            ("7", Vec::from(DOM7)),
            ("dom9", Vec::from(DOM9)),
            ("dom11", Vec::from(DOM11)),
            ("dom13", Vec::from(DOM13)),
            ("7f5", Vec::from(SEVEN_FLAT5)),
            ("7s5", Vec::from(SEVEN_SHARP5)),
            ("7f9", Vec::from(SEVEN_FLAT9)),
            ("nine", Vec::from(NINE)),
            ("9", Vec::from(NINE)),
            ("eleven", Vec::from(ELEVEN)),
            ("11", Vec::from(ELEVEN)),
            ("thirteen", Vec::from(THIRTEEN)),
            ("13", Vec::from(THIRTEEN)),
            ("minor", Vec::from(MINOR)),
            ("min", Vec::from(MINOR)),
            ("m", Vec::from(MINOR)),
            ("diminished", Vec::from(DIMINISHED)),
            ("dim", Vec::from(DIMINISHED)),
            ("minor6", Vec::from(MINOR6)),
            ("min6", Vec::from(MINOR6)),
            ("m6", Vec::from(MINOR6)),
            ("minor7f5", Vec::from(MINOR7FLAT5)),
            ("min7f5", Vec::from(MINOR7FLAT5)),
            ("m7f5", Vec::from(MINOR7FLAT5)),
            ("minor7", Vec::from(MINOR7)),
            ("min7", Vec::from(MINOR7)),
            ("m7", Vec::from(MINOR7)),
            ("diminished7", Vec::from(DIMINISHED7)),
            ("dim7", Vec::from(DIMINISHED7)),
            ("minor9", Vec::from(MINOR9)),
            ("min9", Vec::from(MINOR9)),
            ("m9", Vec::from(MINOR9)),
            ("minor11", Vec::from(MINOR11)),
            ("min11", Vec::from(MINOR11)),
            ("m11", Vec::from(MINOR11)),
            ("minor13", Vec::from(MINOR13)),
            ("min13", Vec::from(MINOR13)),
            ("m13", Vec::from(MINOR13)),
            ("minorMajor7", Vec::from(MINOR_MAJOR7)),
            ("minMaj7", Vec::from(MINOR_MAJOR7)),
            ("mM7", Vec::from(MINOR_MAJOR7)),
            ("one", Vec::from(ONE)),
            ("1", Vec::from(ONE)),
            ("five", Vec::from(FIVE)),
            ("5", Vec::from(FIVE)),
            ("sus2", Vec::from(SUS2)),
            ("sus4", Vec::from(SUS4)),
            ("7sus2", Vec::from(SEVEN_SUS2)),
            ("7sus4", Vec::from(SEVEN_SUS4)),
            ("9sus4", Vec::from(NINE_SUS4)),
        ])
    };
}

/// Interval list for a chord name. Unknown names expand to the bare root so
/// odd inputs still compile.
pub fn chord_intervals(name: &str) -> Vec<i32> {
    CHORD_TABLE.get(name).cloned().unwrap_or_else(|| vec![0])
}

/// All known chord names, sorted.
pub fn chord_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = CHORD_TABLE.keys().copied().collect();
    names.sort_unstable();
    names
}

// -------------------------------------------------------------------------------------------------

/// Upper bound on the interval stream a `Range` modifier may request, so a
/// huge count cannot spin the octave lift forever.
pub const RANGE_CAP: usize = 128;

/// A voicing transform applied to a chord's interval list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modifier {
    /// Keep the first n notes of the chord lifted through successive octaves.
    Range(i32),
    /// Drop the n-th note from the top down an octave.
    Drop(i32),
    /// Move the lowest note up an octave.
    Invert,
    /// Spread the lower notes of the chord apart.
    Open,
}

impl Modifier {
    /// Applies the modifier to a list of already root-offset note values.
    pub fn apply(&self, notes: Vec<f64>) -> Vec<f64> {
        match *self {
            Modifier::Range(n) => {
                if notes.is_empty() {
                    return notes;
                }
                let want = n.max(0) as usize;
                let mut out = Vec::with_capacity(want.min(RANGE_CAP));
                'lift: for octave in 0.. {
                    for note in &notes {
                        if out.len() >= want || out.len() >= RANGE_CAP {
                            break 'lift;
                        }
                        out.push(note + f64::from(octave) * 12.0);
                    }
                }
                out
            }
            Modifier::Drop(n) => {
                if n < 1 || notes.len() < n as usize {
                    return notes;
                }
                let mut out = notes;
                let at = out.len() - n as usize;
                out[at] -= 12.0;
                out
            }
            Modifier::Invert => {
                if notes.is_empty() {
                    return notes;
                }
                let mut out = notes;
                let head = out.remove(0);
                out.push(head + 12.0);
                out
            }
            Modifier::Open => {
                if notes.len() <= 2 {
                    return notes;
                }
                let mut out = vec![notes[0] - 12.0, notes[2] - 12.0, notes[1]];
                out.extend_from_slice(&notes[3..]);
                out
            }
        }
    }
}

/// Folds a modifier list over an interval list, left to right.
pub fn apply_modifiers(modifiers: &[Modifier], notes: Vec<f64>) -> Vec<f64> {
    modifiers.iter().fold(notes, |acc, m| m.apply(acc))
}

/// Parses one `'`-group of chord modifiers: a run of `i`s (inversions), a run
/// of `o`s (opens), `d` with a count (drop), or a bare count (range).
pub fn parse_modifier_group(text: &str) -> Result<Vec<Modifier>, String> {
    if text.is_empty() {
        return Err("empty chord modifier".to_string());
    }
    if text.chars().all(|c| c == 'i') {
        return Ok(vec![Modifier::Invert; text.len()]);
    }
    if text.chars().all(|c| c == 'o') {
        return Ok(vec![Modifier::Open; text.len()]);
    }
    if let Some(count) = text.strip_prefix('d') {
        let n = count
            .parse::<i32>()
            .map_err(|_| format!("invalid drop modifier '{}'", text))?;
        return Ok(vec![Modifier::Drop(n)]);
    }
    match text.parse::<i32>() {
        Ok(n) => Ok(vec![Modifier::Range(n)]),
        Err(_) => Err(format!("invalid chord modifier '{}'", text)),
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(chord_intervals("maj"), vec![0, 4, 7]);
        assert_eq!(chord_intervals("major"), vec![0, 4, 7]);
        assert_eq!(chord_intervals("min7"), vec![0, 3, 7, 10]);
        assert_eq!(chord_intervals("qwe"), vec![0]);
    }

    #[test]
    fn invert() {
        assert_eq!(
            Modifier::Invert.apply(vec![0.0, 4.0, 7.0]),
            vec![4.0, 7.0, 12.0]
        );
        assert_eq!(Modifier::Invert.apply(vec![]), Vec::<f64>::new());
    }

    #[test]
    fn open() {
        assert_eq!(
            Modifier::Open.apply(vec![0.0, 4.0, 7.0]),
            vec![-12.0, -5.0, 4.0]
        );
        assert_eq!(
            Modifier::Open.apply(vec![0.0, 4.0, 7.0, 11.0]),
            vec![-12.0, -5.0, 4.0, 11.0]
        );
        assert_eq!(Modifier::Open.apply(vec![0.0, 7.0]), vec![0.0, 7.0]);
    }

    #[test]
    fn drop_voicings() {
        assert_eq!(
            Modifier::Drop(1).apply(vec![0.0, 4.0, 7.0]),
            vec![0.0, 4.0, -5.0]
        );
        assert_eq!(
            Modifier::Drop(2).apply(vec![0.0, 4.0, 7.0]),
            vec![0.0, -8.0, 7.0]
        );
        assert_eq!(
            Modifier::Drop(4).apply(vec![0.0, 4.0, 7.0]),
            vec![0.0, 4.0, 7.0]
        );
    }

    #[test]
    fn range() {
        assert_eq!(
            Modifier::Range(5).apply(vec![0.0, 4.0, 7.0]),
            vec![0.0, 4.0, 7.0, 12.0, 16.0]
        );
        assert_eq!(Modifier::Range(2).apply(vec![0.0, 4.0, 7.0]), vec![0.0, 4.0]);
        assert_eq!(Modifier::Range(0).apply(vec![0.0, 4.0, 7.0]), Vec::<f64>::new());
        assert_eq!(
            Modifier::Range(1000).apply(vec![0.0]).len(),
            RANGE_CAP
        );
    }

    #[test]
    fn modifier_groups() {
        assert_eq!(
            parse_modifier_group("ii"),
            Ok(vec![Modifier::Invert, Modifier::Invert])
        );
        assert_eq!(parse_modifier_group("o"), Ok(vec![Modifier::Open]));
        assert_eq!(parse_modifier_group("5"), Ok(vec![Modifier::Range(5)]));
        assert_eq!(parse_modifier_group("d2"), Ok(vec![Modifier::Drop(2)]));
        assert!(parse_modifier_group("ix").is_err());
        assert!(parse_modifier_group("").is_err());
    }

    #[test]
    fn stacked_modifiers_fold_in_order() {
        let notes = apply_modifiers(
            &[Modifier::Invert, Modifier::Open],
            vec![0.0, 4.0, 7.0],
        );
        // invert first: [4, 7, 12], then open: [4-12, 12-12, 7]
        assert_eq!(notes, vec![-8.0, 0.0, 7.0]);
    }
}
