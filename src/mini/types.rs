//! Leaf-type capabilities: what each supported value type can parse,
//! enumerate and read back from control channels.

use fraction::Fraction;

use crate::chord::{self, Modifier};
use crate::color::{named_color, Color};
use crate::control::{control, ControlValue};
use crate::note::{parse_note_name, Note};
use crate::pattern::{pure, silence, Pattern, Value};

// -------------------------------------------------------------------------------------------------

/// A type usable as a mini-notation leaf. The parse entry point picks the
/// implementation, which decides how leaf tokens read, what euclidean
/// off-steps play, whether the type owns control channels, and whether chord
/// expansion can inject semitone values into it.
pub trait Parseable: Value + PartialEq {
    /// Interprets a leaf token. The token text is already lexed; this only
    /// decides what it means for this type.
    fn parse_leaf(text: &str) -> Result<Self, String>;

    /// Pattern played on the off-steps of a euclidean rhythm.
    fn euclid_off() -> Pattern<Self> {
        silence()
    }

    /// Pattern reading the named control channel; silence for types without
    /// channels.
    fn control_pattern(_name: &str) -> Pattern<Self> {
        silence()
    }

    /// Injection from a chord expansion's semitone values, for types that can
    /// take a chord suffix.
    fn from_semitone(_semitone: f64) -> Option<Self> {
        None
    }
}

/// Inclusive enumeration between two leaf values, as used by `a .. b`.
/// Numeric types count in unit steps, descending when start exceeds end;
/// types without a numeric order degenerate to the listed end points.
pub trait Enumerable: Sized {
    fn from_to(a: Self, b: Self) -> Vec<Self>;
    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self>;
}

// -------------------------------------------------------------------------------------------------

/// Parses a rational literal: optional sign, a decimal number, an optional
/// `%denominator` and an optional musical duration letter, all combined
/// multiplicatively. `3%4e` is three quarters of an eighth.
pub fn parse_ratio(text: &str) -> Result<Fraction, String> {
    let err = || format!("invalid ratio '{}'", text);

    let mut rest = text;
    let mut negative = false;
    if let Some(r) = rest.strip_prefix('-') {
        negative = true;
        rest = r;
    } else if let Some(r) = rest.strip_prefix('+') {
        rest = r;
    }

    let numeric_end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (number, mut tail) = rest.split_at(numeric_end);
    let mut value = decimal_fraction(number).ok_or_else(err)?;

    if let Some(t) = tail.strip_prefix('%') {
        let den_end = t
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(t.len());
        let (den, t) = t.split_at(den_end);
        let den: u64 = den.parse().map_err(|_| err())?;
        if den == 0 {
            return Err(err());
        }
        value = value / Fraction::from(den);
        tail = t;
    }

    let mut letters = tail.chars();
    if let Some(letter) = letters.next() {
        if letters.next().is_some() {
            return Err(err());
        }
        value = value * duration_letter(letter).ok_or_else(err)?;
    }

    Ok(if negative { -value } else { value })
}

/// Exact decimal-to-rational conversion, so `0.1` really is one tenth.
fn decimal_fraction(text: &str) -> Option<Fraction> {
    if text.is_empty() {
        return None;
    }
    match text.split_once('.') {
        None => text.parse::<u64>().ok().map(Fraction::from),
        Some((int, frac)) => {
            if frac.contains('.') {
                return None;
            }
            let int: u64 = if int.is_empty() { 0 } else { int.parse().ok()? };
            let scale = 10u64.checked_pow(frac.len() as u32)?;
            let frac: u64 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
            Some(Fraction::from(int) + Fraction::new(frac, scale))
        }
    }
}

fn duration_letter(letter: char) -> Option<Fraction> {
    match letter {
        'w' => Some(Fraction::from(1)),
        'h' => Some(Fraction::new(1u64, 2u64)),
        'q' => Some(Fraction::new(1u64, 4u64)),
        'e' => Some(Fraction::new(1u64, 8u64)),
        's' => Some(Fraction::new(1u64, 16u64)),
        't' => Some(Fraction::new(1u64, 3u64)),
        'f' => Some(Fraction::new(1u64, 5u64)),
        'x' => Some(Fraction::new(1u64, 6u64)),
        _ => None,
    }
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '-' | '_'))
}

// -------------------------------------------------------------------------------------------------

impl Parseable for String {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        if is_name(text) {
            Ok(text.to_string())
        } else {
            Err(format!("invalid name '{}'", text))
        }
    }

    fn control_pattern(name: &str) -> Pattern<Self> {
        control(name, ControlValue::to_name)
    }
}

impl Enumerable for String {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        vec![a, b]
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        vec![a, b, c]
    }
}

impl Parseable for char {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Ok(c),
            _ => Err(format!("expected a single character, got '{}'", text)),
        }
    }
}

impl Enumerable for char {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        let (x, y) = (a as u32, b as u32);
        if x <= y {
            (x..=y).filter_map(char::from_u32).collect()
        } else {
            (y..=x).rev().filter_map(char::from_u32).collect()
        }
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        let step = b as i64 - a as i64;
        if step == 0 {
            return vec![a];
        }
        let mut out = vec![];
        let mut x = a as i64;
        let end = c as i64;
        while (step > 0 && x <= end) || (step < 0 && x >= end) {
            if let Some(ch) = u32::try_from(x).ok().and_then(char::from_u32) {
                out.push(ch);
            }
            x += step;
        }
        out
    }
}

impl Parseable for bool {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        match text {
            "t" | "1" => Ok(true),
            "f" | "0" => Ok(false),
            _ => Err(format!("expected t, f, 1 or 0, got '{}'", text)),
        }
    }

    fn euclid_off() -> Pattern<Self> {
        pure(false)
    }

    fn control_pattern(name: &str) -> Pattern<Self> {
        control(name, ControlValue::to_bool)
    }
}

impl Enumerable for bool {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        vec![a, b]
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        vec![a, b, c]
    }
}

impl Parseable for f64 {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        if let Ok(value) = text.parse::<f64>() {
            if value.is_finite() {
                return Ok(value);
            }
        }
        parse_note_name(text)
            .ok_or_else(|| format!("expected a number or note name, got '{}'", text))
    }

    fn control_pattern(name: &str) -> Pattern<Self> {
        control(name, ControlValue::to_float)
    }

    fn from_semitone(semitone: f64) -> Option<Self> {
        Some(semitone)
    }
}

impl Enumerable for f64 {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        numeric_from_to(a, b, |x| x + 1.0, |x| x - 1.0, |x, y| x <= y, |x, y| x >= y)
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        let step = b - a;
        if step == 0.0 {
            return vec![a];
        }
        let mut out = vec![];
        let mut x = a;
        while (step > 0.0 && x <= c) || (step < 0.0 && x >= c) {
            out.push(x);
            x += step;
        }
        out
    }
}

impl Parseable for Note {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        f64::parse_leaf(text).map(Note)
    }

    fn control_pattern(name: &str) -> Pattern<Self> {
        control(name, |v| v.to_float().map(Note))
    }

    fn from_semitone(semitone: f64) -> Option<Self> {
        Some(Note(semitone))
    }
}

impl Enumerable for Note {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        f64::from_to(a.0, b.0).into_iter().map(Note).collect()
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        f64::from_then_to(a.0, b.0, c.0).into_iter().map(Note).collect()
    }
}

impl Parseable for i32 {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        integral_leaf(text).and_then(|v| {
            i32::try_from(v).map_err(|_| format!("integer '{}' is out of range", text))
        })
    }

    fn control_pattern(name: &str) -> Pattern<Self> {
        control(name, |v| {
            v.to_int().and_then(|i| i32::try_from(i).ok())
        })
    }
}

impl Enumerable for i32 {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        if a <= b {
            (a..=b).collect()
        } else {
            (b..=a).rev().collect()
        }
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        i64::from_then_to(a as i64, b as i64, c as i64)
            .into_iter()
            .map(|v| v as i32)
            .collect()
    }
}

impl Parseable for i64 {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        integral_leaf(text)
    }

    fn control_pattern(name: &str) -> Pattern<Self> {
        control(name, ControlValue::to_int)
    }
}

impl Enumerable for i64 {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        if a <= b {
            (a..=b).collect()
        } else {
            (b..=a).rev().collect()
        }
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        let step = b - a;
        if step == 0 {
            return vec![a];
        }
        let mut out = vec![];
        let mut x = a;
        while (step > 0 && x <= c) || (step < 0 && x >= c) {
            out.push(x);
            x += step;
        }
        out
    }
}

/// The shared integral lexer: a plain integer, or a numeric literal that
/// happens to be whole. Fractional input is a type error here.
fn integral_leaf(text: &str) -> Result<i64, String> {
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        Ok(_) => Err(format!("expected an integer, got '{}'", text)),
        Err(_) => Err(format!("expected an integer, got '{}'", text)),
    }
}

impl Parseable for Fraction {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        parse_ratio(text)
    }

    fn control_pattern(name: &str) -> Pattern<Self> {
        control(name, ControlValue::to_ratio)
    }
}

impl Enumerable for Fraction {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        let one = Fraction::from(1);
        numeric_from_to(a, b, |x| x + one, |x| x - one, |x, y| x <= y, |x, y| x >= y)
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        let step = b - a;
        if step == Fraction::from(0) {
            return vec![a];
        }
        let ascending = step > Fraction::from(0);
        let mut out = vec![];
        let mut x = a;
        while (ascending && x <= c) || (!ascending && x >= c) {
            out.push(x);
            x = x + step;
        }
        out
    }
}

impl Parseable for Color {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        if text.chars().all(|c| c.is_ascii_alphabetic()) {
            named_color(text).ok_or_else(|| format!("unknown colour '{}'", text))
        } else {
            Err(format!("expected a colour name, got '{}'", text))
        }
    }
}

impl Enumerable for Color {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        vec![a, b]
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        vec![a, b, c]
    }
}

impl Parseable for Vec<Modifier> {
    fn parse_leaf(text: &str) -> Result<Self, String> {
        chord::parse_modifier_group(text)
    }
}

impl Enumerable for Vec<Modifier> {
    fn from_to(a: Self, b: Self) -> Vec<Self> {
        vec![a, b]
    }

    fn from_then_to(a: Self, b: Self, c: Self) -> Vec<Self> {
        vec![a, b, c]
    }
}

fn numeric_from_to<T: Copy>(
    a: T,
    b: T,
    up: impl Fn(T) -> T,
    down: impl Fn(T) -> T,
    le: impl Fn(T, T) -> bool,
    ge: impl Fn(T, T) -> bool,
) -> Vec<T> {
    let mut out = vec![];
    let mut x = a;
    if le(a, b) {
        while le(x, b) {
            out.push(x);
            x = up(x);
        }
    } else {
        while ge(x, b) {
            out.push(x);
            x = down(x);
        }
    }
    out
}

// -------------------------------------------------------------------------------------------------
