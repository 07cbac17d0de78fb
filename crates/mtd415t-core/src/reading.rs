//! Readings that may be unavailable
//!
//! A query that times out is not an error for polling code: it yields
//! [`Reading::Unavailable`] instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text reported in place of a value that could not be read
pub const UNAVAILABLE: &str = "<timeout>";

/// Result of a read that may have timed out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reading<T> {
    /// The controller answered
    Value(T),
    /// The controller did not answer in time
    Unavailable,
}

impl<T> Reading<T> {
    /// Whether a value was read
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    /// The value, if any
    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Unavailable => None,
        }
    }

    /// Borrow the value, if any
    pub fn as_ref(&self) -> Reading<&T> {
        match self {
            Reading::Value(v) => Reading::Value(v),
            Reading::Unavailable => Reading::Unavailable,
        }
    }

    /// Transform the value, keeping unavailability
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            Reading::Unavailable => Reading::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::Unavailable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => v.fmt(f),
            Reading::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}
