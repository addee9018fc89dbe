//! The typed mini-notation tree.

use fraction::{Fraction, Zero};

use crate::chord::Modifier;
use crate::event::SourceSpan;

// -------------------------------------------------------------------------------------------------

/// A parsed pattern expression, polymorphic in the leaf value type.
///
/// Time-valued and count-valued children are concrete subtrees (`Fraction`,
/// `i32`), so a single tree can mix, say, string leaves with patterned speed
/// factors. `Chord` keeps its root as a semitone-valued subtree; the
/// injection back into `T` happens at compile time through the leaf type's
/// capabilities, which keeps the tree plain data.
#[derive(Clone, Debug, PartialEq)]
pub enum TPat<T> {
    Atom {
        loc: Option<SourceSpan>,
        value: T,
    },
    Fast(Box<TPat<Fraction>>, Box<TPat<T>>),
    Slow(Box<TPat<Fraction>>, Box<TPat<T>>),
    DegradeBy {
        seed: i32,
        amount: f64,
        pat: Box<TPat<T>>,
    },
    CycleChoose {
        seed: i32,
        choices: Vec<TPat<T>>,
    },
    Euclid {
        pulses: Box<TPat<i32>>,
        steps: Box<TPat<i32>>,
        rotation: Box<TPat<i32>>,
        pat: Box<TPat<T>>,
    },
    Stack(Vec<TPat<T>>),
    Polyrhythm {
        step_rate: Option<Box<TPat<Fraction>>>,
        pats: Vec<TPat<T>>,
    },
    Seq(Vec<TPat<T>>),
    Silence,
    /// Sequence splitter; eliminated by `resolve_feet` before compilation.
    Foot,
    Elongate {
        weight: Fraction,
        pat: Box<TPat<T>>,
    },
    Repeat {
        count: u32,
        pat: Box<TPat<T>>,
    },
    EnumFromTo(Box<TPat<T>>, Box<TPat<T>>),
    Var(String),
    Chord {
        root: Box<TPat<f64>>,
        name: Box<TPat<String>>,
        modifiers: Box<TPat<Vec<Modifier>>>,
    },
}

impl<T> TPat<T> {
    pub fn atom(value: T) -> Self {
        TPat::Atom { loc: None, value }
    }

    pub fn atom_at(value: T, loc: SourceSpan) -> Self {
        TPat::Atom {
            loc: Some(loc),
            value,
        }
    }

    /// True when a `Foot` survives anywhere in the tree, including inside
    /// differently-typed subtrees.
    pub fn has_feet(&self) -> bool {
        match self {
            TPat::Foot => true,
            TPat::Atom { .. } | TPat::Silence | TPat::Var(_) => false,
            TPat::Fast(r, p) | TPat::Slow(r, p) => r.has_feet() || p.has_feet(),
            TPat::DegradeBy { pat, .. } => pat.has_feet(),
            TPat::CycleChoose { choices, .. } => choices.iter().any(TPat::has_feet),
            TPat::Euclid {
                pulses,
                steps,
                rotation,
                pat,
            } => {
                pulses.has_feet() || steps.has_feet() || rotation.has_feet() || pat.has_feet()
            }
            TPat::Stack(ps) | TPat::Seq(ps) => ps.iter().any(TPat::has_feet),
            TPat::Polyrhythm { step_rate, pats } => {
                step_rate.as_deref().is_some_and(TPat::has_feet)
                    || pats.iter().any(TPat::has_feet)
            }
            TPat::Elongate { pat, .. } | TPat::Repeat { pat, .. } => pat.has_feet(),
            TPat::EnumFromTo(a, b) => a.has_feet() || b.has_feet(),
            TPat::Chord {
                root,
                name,
                modifiers,
            } => root.has_feet() || name.has_feet() || modifiers.has_feet(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Turns the children of a parsed sequence into a sequence node, splitting at
/// foot markers. With feet present the result is a sequence of equal-weight
/// sub-sequences, one per group; with a single group the sequence stays flat.
/// Empty groups vanish, and no `Foot` ever leaves this function.
pub fn resolve_feet<T>(children: Vec<TPat<T>>) -> TPat<T> {
    let mut groups: Vec<Vec<TPat<T>>> = vec![vec![]];
    for child in children {
        match child {
            TPat::Foot => groups.push(vec![]),
            other => {
                if let Some(group) = groups.last_mut() {
                    group.push(other);
                }
            }
        }
    }
    let mut groups: Vec<Vec<TPat<T>>> = groups.into_iter().filter(|g| !g.is_empty()).collect();
    match groups.len() {
        0 => TPat::Silence,
        1 => TPat::Seq(groups.remove(0)),
        _ => TPat::Seq(groups.into_iter().map(TPat::Seq).collect()),
    }
}

/// The size resolver: maps sequence children to `(weight, child)` pairs.
/// Elongation contributes its ratio, a repeat contributes one unit pair per
/// copy, and every other child weighs one step.
pub fn weighted_children<T: Clone>(children: &[TPat<T>]) -> Vec<(Fraction, TPat<T>)> {
    let mut out = vec![];
    for child in children {
        match child {
            TPat::Elongate { weight, pat } => out.push((*weight, pat.as_ref().clone())),
            TPat::Repeat { count, pat } => {
                for _ in 0..*count {
                    out.push((Fraction::from(1), pat.as_ref().clone()));
                }
            }
            other => out.push((Fraction::from(1), other.clone())),
        }
    }
    out
}

/// Step count of a polyrhythm child: the summed weight of a sequence's
/// children, zero for silence, one for any other node.
pub fn pattern_size<T: Clone>(pat: &TPat<T>) -> Fraction {
    match pat {
        TPat::Seq(children) => weighted_children(children)
            .iter()
            .fold(Fraction::zero(), |acc, (w, _)| acc + *w),
        TPat::Silence => Fraction::zero(),
        _ => Fraction::from(1),
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    type F = Fraction;

    fn a(s: &str) -> TPat<String> {
        TPat::atom(s.to_string())
    }

    #[test]
    fn feet_split_into_groups() {
        let resolved = resolve_feet(vec![a("a"), TPat::Foot, a("b"), a("c")]);
        assert_eq!(
            resolved,
            TPat::Seq(vec![
                TPat::Seq(vec![a("a")]),
                TPat::Seq(vec![a("b"), a("c")]),
            ])
        );
        assert!(!resolved.has_feet());
    }

    #[test]
    fn single_group_stays_flat() {
        assert_eq!(
            resolve_feet(vec![a("a"), a("b")]),
            TPat::Seq(vec![a("a"), a("b")])
        );
        assert_eq!(resolve_feet::<String>(vec![]), TPat::Silence);
        assert_eq!(resolve_feet(vec![TPat::Foot, a("a")]), TPat::Seq(vec![a("a")]));
    }

    #[test]
    fn weights() {
        let children = vec![
            TPat::Elongate {
                weight: F::from(2),
                pat: Box::new(a("a")),
            },
            TPat::Repeat {
                count: 3,
                pat: Box::new(a("b")),
            },
            a("c"),
        ];
        let weighted = weighted_children(&children);
        let weights: Vec<F> = weighted.iter().map(|(w, _)| *w).collect();
        assert_eq!(
            weights,
            vec![F::from(2), F::from(1), F::from(1), F::from(1), F::from(1)]
        );
        let total = weights.iter().fold(F::zero(), |x, y| x + *y);
        assert_eq!(total, F::from(6));
    }

    #[test]
    fn sizes() {
        assert_eq!(pattern_size(&resolve_feet(vec![a("a"), a("b"), a("c")])), F::from(3));
        assert_eq!(pattern_size::<String>(&TPat::Silence), F::from(0));
        assert_eq!(pattern_size(&a("x")), F::from(1));
        let weighted = resolve_feet(vec![
            TPat::Elongate {
                weight: F::from(2),
                pat: Box::new(a("a")),
            },
            a("b"),
        ]);
        assert_eq!(pattern_size(&weighted), F::from(3));
    }
}
