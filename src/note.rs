//! Note names and their semitone values.

use std::fmt::{self, Display};

// -------------------------------------------------------------------------------------------------

/// A pitch as a semitone offset from c5, which sits at zero. Sharp/flat marks
/// and octaves in a literal move the value in semitone and twelve-semitone
/// steps, so `c5` is 0, `cs5` is 1, `c4` is -12.
///
/// The value is a double so chord expansion and control channels can slide
/// notes by fractional amounts.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Note(pub f64);

impl Note {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Note {
    fn from(value: f64) -> Self {
        Note(value)
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -------------------------------------------------------------------------------------------------

fn letter_semitone(letter: char) -> Option<i32> {
    match letter.to_ascii_lowercase() {
        'c' => Some(0),
        'd' => Some(2),
        'e' => Some(4),
        'f' => Some(5),
        'g' => Some(7),
        'a' => Some(9),
        'b' => Some(11),
        _ => None,
    }
}

/// Parses a note literal: a letter `a`..`g`, then any run of `s` (sharp),
/// `f` (flat) and `n` (natural) marks, then an optional octave number
/// (default 5). Returns `None` unless the whole text is consumed.
pub fn parse_note_name(text: &str) -> Option<f64> {
    let mut chars = text.chars().peekable();
    let mut semitone = letter_semitone(chars.next()?)?;
    while let Some(&c) = chars.peek() {
        match c.to_ascii_lowercase() {
            's' => semitone += 1,
            'f' => semitone -= 1,
            'n' => (),
            _ => break,
        }
        chars.next();
    }
    let rest: String = chars.collect();
    let octave = if rest.is_empty() {
        5
    } else {
        rest.parse::<i32>().ok().filter(|o| *o >= 0)?
    };
    Some(f64::from(semitone + (octave - 5) * 12))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_letters() {
        assert_eq!(parse_note_name("c"), Some(0.0));
        assert_eq!(parse_note_name("d"), Some(2.0));
        assert_eq!(parse_note_name("e"), Some(4.0));
        assert_eq!(parse_note_name("f"), Some(5.0));
        assert_eq!(parse_note_name("g"), Some(7.0));
        assert_eq!(parse_note_name("a"), Some(9.0));
        assert_eq!(parse_note_name("b"), Some(11.0));
        assert_eq!(parse_note_name("h"), None);
        assert_eq!(parse_note_name(""), None);
    }

    #[test]
    fn marks() {
        assert_eq!(parse_note_name("cs"), Some(1.0));
        assert_eq!(parse_note_name("cf"), Some(-1.0));
        assert_eq!(parse_note_name("cn"), Some(0.0));
        assert_eq!(parse_note_name("css"), Some(2.0));
        assert_eq!(parse_note_name("ef"), Some(3.0));
        // marks may pile up in any mix
        assert_eq!(parse_note_name("csf"), Some(0.0));
    }

    #[test]
    fn octaves() {
        assert_eq!(parse_note_name("c5"), Some(0.0));
        assert_eq!(parse_note_name("c6"), Some(12.0));
        assert_eq!(parse_note_name("c4"), Some(-12.0));
        assert_eq!(parse_note_name("c0"), Some(-60.0));
        assert_eq!(parse_note_name("as3"), Some(-14.0));
        // trailing junk is not a note
        assert_eq!(parse_note_name("c5x"), None);
        assert_eq!(parse_note_name("c-1"), None);
    }
}
