//! Runtime values.
//!
//! `Value` is a small `Copy` tagged enum. Language equality needs the heap
//! (strings compare by content), so it lives on [`crate::Heap::values_equal`]
//! rather than in a `PartialEq` impl.

use core::fmt;

use crate::object::ObjRef;

/// A dynamically typed value.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    /// `nil`
    Nil,
    /// `true` / `false`
    Bool(bool),
    /// IEEE-754 double.
    Number(f64),
    /// Reference to a heap object.
    Obj(ObjRef),
}

impl Value {
    /// Only `nil` and `false` are falsey.
    pub const fn is_falsey(self) -> bool {
        match self {
            Self::Nil => true,
            Self::Bool(b) => !b,
            Self::Number(_) | Self::Obj(_) => false,
        }
    }

    /// Numeric payload, if any.
    pub const fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Self::Number(n) }
}

/// Heap-free rendering. Objects show as their handle; use
/// [`crate::Heap::display`] to print string contents.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Obj(r) => write!(f, "<obj {r}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsiness() {
        assert!(Value::Nil.is_falsey());
        assert!(Value::Bool(false).is_falsey());
        assert!(!Value::Bool(true).is_falsey());
        assert!(!Value::Number(0.0).is_falsey());
        let mut heap = crate::Heap::new();
        assert!(!Value::Obj(heap.copy_string("")).is_falsey());
    }

    #[test]
    fn number_display_is_shortest_roundtrip() {
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Number(-0.8214285714285714).to_string(), "-0.8214285714285714");
        assert_eq!(Value::Number(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Value::from(true).to_string(), "true");
    }
}
