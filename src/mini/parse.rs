//! Pest-backed recogniser and typed tree builder.

use pest::error::{Error, ErrorVariant};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use fraction::Fraction;

use crate::chord::Modifier;
use crate::event::SourceSpan;
use crate::mini::ast::{resolve_feet, TPat};
use crate::mini::types::{parse_ratio, Parseable};

// -------------------------------------------------------------------------------------------------

#[derive(Parser)]
#[grammar = "mini/mini.pest"]
struct MiniParser;

/// A failed parse: the structured pest error plus the source text it refers
/// to. Displaying it renders the offending line with a caret under the
/// failure column, followed by pest's expecting/unexpected message set.
#[derive(Debug)]
pub struct ParseError {
    error: Box<Error<Rule>>,
    source: String,
}

impl ParseError {
    fn from_pest(error: Error<Rule>, source: &str) -> Self {
        Self {
            error: Box::new(error),
            source: source.to_string(),
        }
    }

    fn custom(message: String, span: pest::Span, source: &str) -> Self {
        let error = Error::new_from_span(ErrorVariant::CustomError { message }, span);
        Self::from_pest(error, source)
    }

    /// 1-based column of the failure.
    pub fn column(&self) -> usize {
        match self.error.line_col {
            pest::error::LineColLocation::Pos((_, col)) => col,
            pest::error::LineColLocation::Span((_, col), _) => col,
        }
    }

    /// 1-based line of the failure.
    pub fn line(&self) -> usize {
        match self.error.line_col {
            pest::error::LineColLocation::Pos((line, _)) => line,
            pest::error::LineColLocation::Span((line, _), _) => line,
        }
    }

    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        &self.source
    }

    /// The underlying structured error.
    pub fn details(&self) -> &Error<Rule> {
        &self.error
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ParseError {}

// -------------------------------------------------------------------------------------------------

/// Parses mini-notation into a typed tree without compiling it. The returned
/// tree is fully foot-resolved.
pub fn parse_tpat<T: Parseable>(input: &str) -> Result<TPat<T>, ParseError> {
    let mut pairs = MiniParser::parse(Rule::mini, input)
        .map_err(|e| ParseError::from_pest(e, input))?;
    let mut builder = Builder { input, seeds: 0 };
    match pairs.next() {
        Some(mini) => match mini.into_inner().next() {
            Some(body) if body.as_rule() == Rule::group_body => builder.body::<T>(body),
            _ => Ok(TPat::Silence),
        },
        None => Ok(TPat::Silence),
    }
}

// -------------------------------------------------------------------------------------------------

/// Tree builder state: the source (for error rendering) and the random-seed
/// counter shared by every `?` and `|` in one parse, in source order.
struct Builder<'a> {
    input: &'a str,
    seeds: i32,
}

impl<'a> Builder<'a> {
    fn next_seed(&mut self) -> i32 {
        let seed = self.seeds;
        self.seeds += 1;
        seed
    }

    fn err(&self, message: String, span: pest::Span) -> ParseError {
        ParseError::custom(message, span, self.input)
    }

    fn loc(pair: &Pair<Rule>) -> SourceSpan {
        let span = pair.as_span();
        let (line, col) = span.start_pos().line_col();
        let (end_line, end_col) = span.end_pos().line_col();
        SourceSpan::new((col, line), (end_col, end_line))
    }

    fn sequence<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let mut children: Vec<TPat<T>> = vec![];
        for step in pair.into_inner() {
            let Some(inner) = step.clone().into_inner().next() else {
                continue;
            };
            match inner.as_rule() {
                Rule::foot => children.push(TPat::Foot),
                Rule::lone_repl => {
                    let copies = repeat_count(inner.as_str());
                    if copies < 1 {
                        return Err(
                            self.err("repeat count must be positive".into(), inner.as_span())
                        );
                    }
                    let previous = children
                        .iter()
                        .rev()
                        .find(|c| !matches!(c, TPat::Foot))
                        .cloned()
                        .unwrap_or(TPat::Silence);
                    for _ in 1..copies {
                        children.push(previous.clone());
                    }
                }
                Rule::entry => self.entry::<T>(inner, &mut children)?,
                _ => {
                    return Err(self.err(
                        format!("unexpected {:?} in sequence", inner.as_rule()),
                        inner.as_span(),
                    ))
                }
            }
        }
        Ok(resolve_feet(children))
    }

    fn entry<T: Parseable>(
        &mut self,
        pair: Pair<Rule>,
        out: &mut Vec<TPat<T>>,
    ) -> Result<(), ParseError> {
        let mut inner = pair.clone().into_inner();
        let Some(part_pair) = inner.next() else {
            return Err(self.err("empty entry".into(), pair.as_span()));
        };
        let part = self.part::<T>(part_pair)?;
        match inner.next() {
            None => out.push(part),
            Some(suffix) => match suffix.as_rule() {
                Rule::range_to => {
                    let Some(to_pair) = suffix.clone().into_inner().next() else {
                        return Err(self.err("missing range end".into(), suffix.as_span()));
                    };
                    let to = self.part::<T>(to_pair)?;
                    out.push(TPat::EnumFromTo(Box::new(part), Box::new(to)));
                }
                Rule::elongate => {
                    let mut weight = Fraction::from(0);
                    for op in suffix.clone().into_inner() {
                        weight = weight + self.elong_weight(&op)?;
                    }
                    if weight <= Fraction::from(0) {
                        return Err(
                            self.err("elongation must be positive".into(), suffix.as_span())
                        );
                    }
                    out.push(TPat::Elongate {
                        weight,
                        pat: Box::new(part),
                    });
                }
                Rule::replicate => {
                    let mut count: i64 = 1;
                    for op in suffix.clone().into_inner() {
                        let n = repeat_count(op.as_str());
                        if n < 1 {
                            return Err(
                                self.err("repeat count must be positive".into(), op.as_span())
                            );
                        }
                        count += n - 1;
                    }
                    out.push(TPat::Repeat {
                        count: count.min(u32::MAX as i64) as u32,
                        pat: Box::new(part),
                    });
                }
                _ => {
                    return Err(self.err(
                        format!("unexpected {:?} after part", suffix.as_rule()),
                        suffix.as_span(),
                    ))
                }
            },
        }
        Ok(())
    }

    fn elong_weight(&self, op: &Pair<Rule>) -> Result<Fraction, ParseError> {
        match op.clone().into_inner().next() {
            None => Ok(Fraction::from(1)),
            Some(ratio) => parse_ratio(ratio.as_str())
                .map_err(|message| self.err(message, ratio.as_span())),
        }
    }

    fn part<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let mut inner = pair.clone().into_inner();
        let Some(core) = inner.next() else {
            return Err(self.err("empty part".into(), pair.as_span()));
        };
        let mut pat = self.part_core::<T>(core)?;
        for suffix in inner {
            match suffix.as_rule() {
                Rule::euclid => pat = self.euclid(suffix, pat)?,
                Rule::degrade => pat = self.degrade(suffix, pat)?,
                _ => {
                    return Err(self.err(
                        format!("unexpected {:?} after part", suffix.as_rule()),
                        suffix.as_span(),
                    ))
                }
            }
        }
        Ok(pat)
    }

    fn part_core<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let mut inner = pair.clone().into_inner();
        let Some(atom) = inner.next() else {
            return Err(self.err("empty part".into(), pair.as_span()));
        };
        let mut pat = self.atom_like::<T>(atom)?;
        for suffix in inner {
            match suffix.as_rule() {
                Rule::degrade => pat = self.degrade(suffix, pat)?,
                Rule::mult => pat = self.mult(suffix, pat)?,
                _ => {
                    return Err(self.err(
                        format!("unexpected {:?} after value", suffix.as_rule()),
                        suffix.as_span(),
                    ))
                }
            }
        }
        Ok(pat)
    }

    fn atom_like<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let Some(inner) = pair.clone().into_inner().next() else {
            return Err(self.err("empty value".into(), pair.as_span()));
        };
        match inner.as_rule() {
            Rule::rest => Ok(TPat::Silence),
            Rule::term => self.term::<T>(inner),
            Rule::group => self.group::<T>(inner),
            Rule::polym => self.polym::<T>(inner),
            Rule::alt => self.alt::<T>(inner),
            Rule::var => self.var(inner),
            other => Err(self.err(format!("unexpected {:?}", other), inner.as_span())),
        }
    }

    fn var<T: Parseable>(&self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        match pair.clone().into_inner().next() {
            Some(name) => Ok(TPat::Var(name.as_str().to_string())),
            None => Err(self.err("missing variable name".into(), pair.as_span())),
        }
    }

    fn degrade<T: Parseable>(
        &mut self,
        pair: Pair<Rule>,
        pat: TPat<T>,
    ) -> Result<TPat<T>, ParseError> {
        let text = pair.as_str().trim_start_matches('?');
        let amount = if text.is_empty() {
            0.5
        } else {
            text.parse::<f64>()
                .map_err(|_| self.err(format!("invalid chance '{}'", text), pair.as_span()))?
        };
        if !(0.0..=1.0).contains(&amount) {
            return Err(self.err(
                "chance must lie between 0 and 1".into(),
                pair.as_span(),
            ));
        }
        Ok(TPat::DegradeBy {
            seed: self.next_seed(),
            amount,
            pat: Box::new(pat),
        })
    }

    fn mult<T: Parseable>(
        &mut self,
        pair: Pair<Rule>,
        pat: TPat<T>,
    ) -> Result<TPat<T>, ParseError> {
        let mut inner = pair.clone().into_inner();
        let (Some(op), Some(factor)) = (inner.next(), inner.next()) else {
            return Err(self.err("incomplete speed factor".into(), pair.as_span()));
        };
        let factor = self.factor(factor)?;
        match op.as_str() {
            "*" => Ok(TPat::Fast(Box::new(factor), Box::new(pat))),
            "/" => Ok(TPat::Slow(Box::new(factor), Box::new(pat))),
            other => Err(self.err(format!("unknown operator '{}'", other), op.as_span())),
        }
    }

    fn factor(&mut self, pair: Pair<Rule>) -> Result<TPat<Fraction>, ParseError> {
        let Some(inner) = pair.clone().into_inner().next() else {
            return Err(self.err("empty factor".into(), pair.as_span()));
        };
        match inner.as_rule() {
            Rule::ratio => {
                let loc = Self::loc(&inner);
                parse_ratio(inner.as_str())
                    .map(|r| TPat::atom_at(r, loc))
                    .map_err(|message| self.err(message, inner.as_span()))
            }
            Rule::group => self.group::<Fraction>(inner),
            Rule::polym => self.polym::<Fraction>(inner),
            Rule::alt => self.alt::<Fraction>(inner),
            other => Err(self.err(format!("unexpected {:?}", other), inner.as_span())),
        }
    }

    fn euclid<T: Parseable>(
        &mut self,
        pair: Pair<Rule>,
        pat: TPat<T>,
    ) -> Result<TPat<T>, ParseError> {
        let mut inner = pair.clone().into_inner();
        let (Some(pulses), Some(steps)) = (inner.next(), inner.next()) else {
            return Err(self.err("incomplete euclidean arguments".into(), pair.as_span()));
        };
        let pulses = self.sequence::<i32>(pulses)?;
        let steps = self.sequence::<i32>(steps)?;
        let rotation = match inner.next() {
            Some(rotation) => self.sequence::<i32>(rotation)?,
            None => TPat::atom(0),
        };
        Ok(TPat::Euclid {
            pulses: Box::new(pulses),
            steps: Box::new(steps),
            rotation: Box::new(rotation),
            pat: Box::new(pat),
        })
    }

    fn group<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        match pair.clone().into_inner().next() {
            Some(body) => self.body::<T>(body),
            None => Ok(TPat::Silence),
        }
    }

    /// Body of a bracket group or of the whole input: a plain sequence, a
    /// `,`-stack or a `|`-choice.
    fn body<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let Some(inner) = pair.clone().into_inner().next() else {
            return Ok(TPat::Silence);
        };
        match inner.as_rule() {
            Rule::stack => {
                let mut layers = vec![];
                for sequence in inner.into_inner() {
                    layers.push(self.sequence::<T>(sequence)?);
                }
                Ok(TPat::Stack(layers))
            }
            Rule::choices => {
                let mut choices = vec![];
                for sequence in inner.into_inner() {
                    choices.push(self.sequence::<T>(sequence)?);
                }
                // the seed follows the choices, in source order
                Ok(TPat::CycleChoose {
                    seed: self.next_seed(),
                    choices,
                })
            }
            Rule::sequence => self.sequence::<T>(inner),
            other => Err(self.err(format!("unexpected {:?}", other), inner.as_span())),
        }
    }

    fn polym<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let mut pats = vec![];
        let mut step_rate = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::polym_body => {
                    for sequence in inner.into_inner() {
                        pats.push(self.sequence::<T>(sequence)?);
                    }
                }
                Rule::pm_rate => {
                    if let Some(factor) = inner.clone().into_inner().next() {
                        step_rate = Some(Box::new(self.factor(factor)?));
                    }
                }
                other => {
                    return Err(self.err(
                        format!("unexpected {:?} in polymeter", other),
                        inner.as_span(),
                    ))
                }
            }
        }
        Ok(TPat::Polyrhythm { step_rate, pats })
    }

    fn alt<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let mut pats = vec![];
        for inner in pair.into_inner() {
            if inner.as_rule() == Rule::polym_body {
                for sequence in inner.into_inner() {
                    pats.push(self.sequence::<T>(sequence)?);
                }
            }
        }
        Ok(TPat::Polyrhythm {
            step_rate: Some(Box::new(TPat::atom(Fraction::from(1)))),
            pats,
        })
    }

    fn term<T: Parseable>(&mut self, pair: Pair<Rule>) -> Result<TPat<T>, ParseError> {
        let mut inner = pair.clone().into_inner();
        let Some(word) = inner.next() else {
            return Err(self.err("empty value".into(), pair.as_span()));
        };
        let suffixes: Vec<Pair<Rule>> = inner.collect();
        if suffixes.is_empty() {
            let loc = Self::loc(&word);
            return T::parse_leaf(word.as_str())
                .map(|value| TPat::atom_at(value, loc))
                .map_err(|message| self.err(message, word.as_span()));
        }

        // chord suffixes demand a leaf type the expansion can inject into
        if T::from_semitone(0.0).is_none() {
            return Err(self.err(
                "chords are only available for note-valued elements".into(),
                pair.as_span(),
            ));
        }
        let root_loc = Self::loc(&word);
        let root = f64::parse_leaf(word.as_str())
            .map(|value| TPat::atom_at(value, root_loc))
            .map_err(|message| self.err(message, word.as_span()))?;

        let mut name = None;
        let mut modifiers = vec![];
        for suffix in suffixes {
            let part = suffix
                .clone()
                .into_inner()
                .next()
                .and_then(|chord_part| chord_part.into_inner().next());
            let Some(part) = part else {
                return Err(self.err("empty chord suffix".into(), suffix.as_span()));
            };
            if name.is_none() {
                name = Some(self.chord_name(part)?);
            } else {
                modifiers.push(self.chord_modifiers(part)?);
            }
        }
        let Some(name) = name else {
            return Err(self.err("missing chord name".into(), pair.as_span()));
        };
        let modifiers = match modifiers.len() {
            0 => TPat::atom(vec![]),
            1 => modifiers.remove(0),
            _ => TPat::Stack(modifiers),
        };
        Ok(TPat::Chord {
            root: Box::new(root),
            name: Box::new(name),
            modifiers: Box::new(modifiers),
        })
    }

    fn chord_name(&mut self, pair: Pair<Rule>) -> Result<TPat<String>, ParseError> {
        match pair.as_rule() {
            Rule::word => {
                let loc = Self::loc(&pair);
                String::parse_leaf(pair.as_str())
                    .map(|value| TPat::atom_at(value, loc))
                    .map_err(|message| self.err(message, pair.as_span()))
            }
            Rule::group => self.group::<String>(pair),
            Rule::alt => self.alt::<String>(pair),
            other => Err(self.err(format!("unexpected {:?}", other), pair.as_span())),
        }
    }

    fn chord_modifiers(&mut self, pair: Pair<Rule>) -> Result<TPat<Vec<Modifier>>, ParseError> {
        match pair.as_rule() {
            Rule::word => {
                let loc = Self::loc(&pair);
                <Vec<Modifier>>::parse_leaf(pair.as_str())
                    .map(|value| TPat::atom_at(value, loc))
                    .map_err(|message| self.err(message, pair.as_span()))
            }
            Rule::group => self.group::<Vec<Modifier>>(pair),
            Rule::alt => self.alt::<Vec<Modifier>>(pair),
            other => Err(self.err(format!("unexpected {:?}", other), pair.as_span())),
        }
    }
}

/// Count carried by a `!` token; a bare `!` stands for one extra copy.
fn repeat_count(text: &str) -> i64 {
    let digits = text.trim_start_matches('!');
    if digits.is_empty() {
        2
    } else {
        digits.parse().unwrap_or(0)
    }
}

// -------------------------------------------------------------------------------------------------
