//! Heap-allocated objects.
//!
//! Every object lives in a [`Heap`] arena owned by the VM and is addressed by
//! an [`ObjRef`] index. There is no per-object deallocation: the arena is
//! cleared in one go once a run is over.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec::Vec};
#[cfg(feature = "std")]
use std::{boxed::Box, string::String, vec::Vec};

use core::fmt;

use crate::value::Value;

/// Handle on an object stored in a [`Heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(u32);

impl ObjRef {
    /// Slot index inside the heap.
    pub const fn index(self) -> usize { self.0 as usize }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// Immutable string object. The length is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjString {
    chars: Box<str>,
}

impl ObjString {
    /// Content as `&str`.
    pub fn as_str(&self) -> &str { &self.chars }
    /// Length in bytes.
    pub fn len(&self) -> usize { self.chars.len() }
    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool { self.chars.is_empty() }
}

/// Object kinds. Strings are the only kind for now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Obj {
    /// String object.
    String(ObjString),
}

impl Obj {
    /// Approximate footprint, used for allocation accounting.
    fn footprint(&self) -> usize {
        match self {
            Self::String(s) => core::mem::size_of::<Self>() + s.len(),
        }
    }
}

/// Object arena.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Obj>,
    bytes_allocated: usize,
}

impl Heap {
    /// Empty heap.
    pub const fn new() -> Self { Self { objects: Vec::new(), bytes_allocated: 0 } }

    fn alloc(&mut self, obj: Obj) -> ObjRef {
        self.bytes_allocated += obj.footprint();
        let id = u32::try_from(self.objects.len()).unwrap_or(u32::MAX);
        self.objects.push(obj);
        ObjRef(id)
    }

    /// Copy `chars` into a new string object.
    pub fn copy_string(&mut self, chars: &str) -> ObjRef { self.take_string(String::from(chars)) }

    /// Move an owned buffer into a new string object.
    pub fn take_string(&mut self, chars: String) -> ObjRef {
        self.alloc(Obj::String(ObjString { chars: chars.into_boxed_str() }))
    }

    /// Object behind a handle, `None` once the heap was cleared.
    pub fn get(&self, r: ObjRef) -> Option<&Obj> { self.objects.get(r.index()) }

    /// String content behind a handle.
    pub fn as_str(&self, r: ObjRef) -> Option<&str> {
        match self.get(r)? {
            Obj::String(s) => Some(s.as_str()),
        }
    }

    /// String content when `value` is a string object.
    pub fn value_as_str(&self, value: Value) -> Option<&str> {
        match value {
            Value::Obj(r) => self.as_str(r),
            _ => None,
        }
    }

    /// Number of live objects.
    pub fn len(&self) -> usize { self.objects.len() }

    /// Whether the arena holds no object.
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }

    /// Bytes accounted since the last [`Heap::free_objects`].
    pub const fn bytes_allocated(&self) -> usize { self.bytes_allocated }

    /// Drop every object allocated after the first `len`. Handles to the
    /// dropped objects become dangling.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.objects.len() {
            return;
        }
        let freed: usize = self.objects.drain(len..).map(|obj| obj.footprint()).sum();
        self.bytes_allocated = self.bytes_allocated.saturating_sub(freed);
    }

    /// Release every object. Outstanding [`ObjRef`]s become dangling.
    pub fn free_objects(&mut self) {
        self.objects.clear();
        self.bytes_allocated = 0;
    }

    /// Language equality: exhaustive over value kinds, strings by content.
    pub fn values_equal(&self, a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            #[allow(clippy::float_cmp)]
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Obj(x), Value::Obj(y)) => {
                x == y
                    || match (self.get(x), self.get(y)) {
                        (Some(Obj::String(s)), Some(Obj::String(t))) => s == t,
                        _ => false,
                    }
            }
            (Value::Nil | Value::Bool(_) | Value::Number(_) | Value::Obj(_), _) => false,
        }
    }

    /// Printable view of `value`, resolving objects through this heap.
    pub const fn display(&self, value: Value) -> ValueDisplay<'_> { ValueDisplay { heap: self, value } }
}

/// Formats a [`Value`] the way `print` shows it.
pub struct ValueDisplay<'h> {
    heap: &'h Heap,
    value: Value,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Obj(r) => match self.heap.get(r) {
                Some(Obj::String(s)) => f.write_str(s.as_str()),
                None => write!(f, "<dangling {r}>"),
            },
            other => write!(f, "{other}"),
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
