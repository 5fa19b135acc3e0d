//! Event argument shapes shared by the dispatcher, channel state, and
//! processor `fire_event` implementations.

use crate::tstamp::Tstamp;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventArg {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Time(Tstamp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    None,
    Bool,
    Int,
    Float,
    Time,
}

impl EventArg {
    pub fn shape(&self) -> ArgShape {
        match self {
            EventArg::None => ArgShape::None,
            EventArg::Bool(_) => ArgShape::Bool,
            EventArg::Int(_) => ArgShape::Int,
            EventArg::Float(_) => ArgShape::Float,
            EventArg::Time(_) => ArgShape::Time,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EventArg::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            EventArg::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            EventArg::Float(f) => Some(*f),
            EventArg::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<Tstamp> {
        match self {
            EventArg::Time(t) => Some(*t),
            _ => None,
        }
    }
}

/// A parsed event ready for dispatch: a name (matched against
/// [`crate::event::registry`]) plus its argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub arg: EventArg,
}

impl Event {
    pub fn new(name: impl Into<String>, arg: EventArg) -> Self {
        Event { name: name.into(), arg }
    }
}
