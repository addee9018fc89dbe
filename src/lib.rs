//! Parser and compiler for a live-coding mini-notation, producing patterns
//! that map rational time windows to event lists.

// -------------------------------------------------------------------------------------------------

// Clippy lints

#![warn(clippy::clone_on_ref_ptr)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]

// -------------------------------------------------------------------------------------------------

// Internal mods
mod chord;
mod color;
mod control;
mod event;
mod note;
mod pattern;
mod span;

// Re-Exported basic types
pub use crate::{
    chord::{apply_modifiers, chord_intervals, chord_names, Modifier},
    color::{named_color, Color},
    control::{ControlMap, ControlValue},
    event::{Event, SourceSpan},
    mini::{parse_mini, parse_mini_or_panic, parse_tpat, Enumerable, ParseError, Parseable, TPat},
    note::Note,
    pattern::{Pattern, State, Value},
    span::{cycle_pos, sam, Span, Time},
};

/// Pattern constructors and combinators.
pub mod patterns {
    pub use super::pattern::{
        choose_by, collect, collect_by, degrade_by_using, euclid, euclid_with, fast, fast_by,
        fast_from_list, fastcat, inner_join, join, map2, map3, pure, rand, rot_left, rot_right,
        segment, signal, silence, slow, slow_by, stack, time_to_rand, timecat, uncollect,
    };
    pub use super::pattern::euclidean::euclidean;
}

// Public modules
pub mod mini;
