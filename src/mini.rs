//! Mini-notation: a one-line textual language for cyclic patterns.
//!
//! ```rust
//! use minicycle::{parse_mini, Pattern};
//!
//! let pattern: Pattern<String> = parse_mini("bd sn [bd bd] sn").unwrap();
//! assert_eq!(pattern.first_cycle().len(), 5);
//! ```

pub mod ast;
pub mod compile;
pub mod parse;
pub mod types;

pub use ast::TPat;
pub use parse::{parse_tpat, ParseError};
pub use types::{Enumerable, Parseable};

use crate::pattern::Pattern;

/// Parses and compiles mini-notation for the chosen leaf type.
///
/// The leaf type decides how atoms read: `"bd sn"` is two names for
/// `Pattern<String>` and a parse error for `Pattern<i32>`, while `"c e g"`
/// is three pitches for `Pattern<Note>`.
pub fn parse_mini<T>(input: &str) -> Result<Pattern<T>, ParseError>
where
    T: Parseable + Enumerable,
{
    parse_tpat(input).map(|tpat| compile::to_pat(&tpat))
}

/// [`parse_mini`] for inputs that are expected to be well-formed, typically
/// literals baked into a program. A malformed input is a programming error
/// and panics with the rendered parse failure.
pub fn parse_mini_or_panic<T>(input: &str) -> Pattern<T>
where
    T: Parseable + Enumerable,
{
    match parse_mini(input) {
        Ok(pattern) => pattern,
        Err(error) => panic!("malformed pattern input:\n{}", error),
    }
}
