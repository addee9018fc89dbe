//! Named control channels read by `^name` pattern variables.

use std::collections::HashMap;
use std::sync::Arc;

use crate::pattern::{Pattern, Value};
use crate::span::Time;

// -------------------------------------------------------------------------------------------------

/// A value fed into a pattern query from the outside world (an editor widget,
/// a MIDI fader, another pattern's output bus).
#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    Float(f64),
    Int(i64),
    Str(String),
    Bool(bool),
    Ratio(Time),
}

impl ControlValue {
    pub fn to_float(&self) -> Option<f64> {
        match self {
            ControlValue::Float(f) => Some(*f),
            ControlValue::Int(i) => Some(*i as f64),
            ControlValue::Bool(b) => Some(u8::from(*b) as f64),
            ControlValue::Ratio(r) => fraction::ToPrimitive::to_f64(r),
            ControlValue::Str(_) => None,
        }
    }

    pub fn to_int(&self) -> Option<i64> {
        match self {
            ControlValue::Int(i) => Some(*i),
            ControlValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            ControlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            ControlValue::Bool(b) => Some(*b),
            ControlValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn to_ratio(&self) -> Option<Time> {
        match self {
            ControlValue::Ratio(r) => Some(*r),
            ControlValue::Int(i) => Some(Time::from(*i)),
            ControlValue::Float(f) => Some(Time::from(*f)),
            _ => None,
        }
    }

    pub fn to_name(&self) -> Option<String> {
        match self {
            ControlValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Immutable name -> value map carried by a query. Cloning is cheap, so every
/// sub-query of a pattern tree shares one underlying table.
#[derive(Clone, Debug, Default)]
pub struct ControlMap(Arc<HashMap<String, ControlValue>>);

impl ControlMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ControlValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: ControlValue) {
        Arc::make_mut(&mut self.0).insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ControlValue)> for ControlMap {
    fn from_iter<I: IntoIterator<Item = (String, ControlValue)>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

// -------------------------------------------------------------------------------------------------

/// A pattern reading the named channel from the query's control map. Queries
/// behave like `pure` of the channel's current value, or silence while the
/// channel is absent or of an unconvertible type.
pub fn control<T, F>(name: &str, convert: F) -> Pattern<T>
where
    T: Value,
    F: Fn(&ControlValue) -> Option<T> + Send + Sync + 'static,
{
    let name = name.to_string();
    Pattern::new(move |state| {
        match state.controls.get(&name).and_then(&convert) {
            Some(value) => crate::pattern::pure(value).query(state),
            None => vec![],
        }
    })
}

// -------------------------------------------------------------------------------------------------
