//! Bounded operand stack.

use allo_core::Value;

use crate::error::RuntimeErrorKind;

/// Default stack depth: room for every local slot plus the temporaries of
/// the expressions that use them.
pub const STACK_MAX: usize = allo_compiler::LOCALS_MAX * 4;

/// Value stack with a hard maximum size. Locals live in it too: slot `n`
/// is the `n`-th value from the bottom.
#[derive(Debug)]
pub struct ValueStack {
    items: Vec<Value>,
    max_size: usize,
}

impl Default for ValueStack {
    fn default() -> Self { Self::new(STACK_MAX) }
}

impl ValueStack {
    /// Empty stack holding at most `max_size` values.
    pub fn new(max_size: usize) -> Self {
        Self { items: Vec::with_capacity(max_size.min(STACK_MAX)), max_size }
    }

    /// Pushes a value.
    ///
    /// # Errors
    /// `StackOverflow` when the stack is full.
    #[inline]
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeErrorKind> {
        if self.items.len() >= self.max_size {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.items.push(value);
        Ok(())
    }

    /// Pops the top value.
    ///
    /// # Errors
    /// `StackUnderflow` on an empty stack, which only malformed bytecode causes.
    #[inline]
    pub fn pop(&mut self) -> Result<Value, RuntimeErrorKind> {
        self.items.pop().ok_or(RuntimeErrorKind::StackUnderflow)
    }

    /// Value `distance` slots below the top (0 = top).
    ///
    /// # Errors
    /// `StackUnderflow` when fewer than `distance + 1` values are present.
    #[inline]
    pub fn peek(&self, distance: usize) -> Result<Value, RuntimeErrorKind> {
        self.items
            .len()
            .checked_sub(distance + 1)
            .and_then(|i| self.items.get(i).copied())
            .ok_or(RuntimeErrorKind::StackUnderflow)
    }

    /// Local slot read.
    ///
    /// # Errors
    /// `StackUnderflow` when the slot is not on the stack.
    #[inline]
    pub fn get(&self, slot: usize) -> Result<Value, RuntimeErrorKind> {
        self.items.get(slot).copied().ok_or(RuntimeErrorKind::StackUnderflow)
    }

    /// Local slot write.
    ///
    /// # Errors
    /// `StackUnderflow` when the slot is not on the stack.
    #[inline]
    pub fn set(&mut self, slot: usize, value: Value) -> Result<(), RuntimeErrorKind> {
        let cell = self.items.get_mut(slot).ok_or(RuntimeErrorKind::StackUnderflow)?;
        *cell = value;
        Ok(())
    }

    /// Drops every value.
    pub fn reset(&mut self) { self.items.clear(); }

    /// Number of values.
    pub fn len(&self) -> usize { self.items.len() }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Maximum depth.
    pub const fn max_size(&self) -> usize { self.max_size }

    /// Bottom-to-top view.
    pub fn as_slice(&self) -> &[Value] { &self.items }
}
