//! Core bytecode structures: a growable byte buffer, a per-byte line table
//! and a constant pool addressed by a one-byte index.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

use core::{fmt, iter::Enumerate, slice};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Largest number of constants a single chunk can address (`u8` operand).
pub const CONSTANTS_MAX: usize = u8::MAX as usize + 1;

/// Minimum capacity of a freshly grown buffer.
const MIN_CAPACITY: usize = 8;

/// Geometric growth policy for chunk buffers: `0 → 8 → 16 → 32 …`.
pub const fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY { MIN_CAPACITY } else { capacity * 2 }
}

/* ─────────────────────────── Opcodes ─────────────────────────── */

/// Instruction set. Each opcode is one byte, optionally followed by
/// fixed-width operands (see [`OpCode::operand_width`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum OpCode {
    /// Push constant `u8` onto the stack.
    Constant,
    /// Push `nil`.
    Nil,
    /// Push `true`.
    True,
    /// Push `false`.
    False,
    /// Discard the top of the stack.
    Pop,
    /// Push the local stored in slot `u8`.
    GetLocal,
    /// Store the top of the stack in slot `u8` (value stays on the stack).
    SetLocal,
    /// Push the global named by constant `u8`.
    GetGlobal,
    /// Pop the top of the stack into a new global named by constant `u8`.
    DefineGlobal,
    /// Assign an existing global named by constant `u8` (value stays).
    SetGlobal,
    /// `a == b`
    Equal,
    /// `a != b`
    NotEqual,
    /// `a > b`
    Greater,
    /// `a >= b`
    GreaterEqual,
    /// `a < b`
    Less,
    /// `a <= b`
    LessEqual,
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
    /// Logical not (truthiness).
    Not,
    /// Arithmetic negation.
    Negate,
    /// Pop and print the top of the stack.
    Print,
    /// Unconditional forward jump by `u16`.
    Jump,
    /// Forward jump by `u16` when the top of the stack is falsey (no pop).
    JumpIfFalse,
    /// Backward jump by `u16`.
    Loop,
    /// End of chunk execution.
    Return,
}

impl OpCode {
    /// Every opcode, indexed by its byte value.
    pub const ALL: [Self; 27] = [
        Self::Constant,
        Self::Nil,
        Self::True,
        Self::False,
        Self::Pop,
        Self::GetLocal,
        Self::SetLocal,
        Self::GetGlobal,
        Self::DefineGlobal,
        Self::SetGlobal,
        Self::Equal,
        Self::NotEqual,
        Self::Greater,
        Self::GreaterEqual,
        Self::Less,
        Self::LessEqual,
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Not,
        Self::Negate,
        Self::Print,
        Self::Jump,
        Self::JumpIfFalse,
        Self::Loop,
        Self::Return,
    ];

    /// Byte value of the opcode.
    pub const fn as_byte(self) -> u8 { self as u8 }

    /// Decodes an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Self> { Self::ALL.get(usize::from(byte)).copied() }

    /// Number of operand bytes following the opcode.
    pub const fn operand_width(self) -> usize {
        match self {
            Self::Constant
            | Self::GetLocal
            | Self::SetLocal
            | Self::GetGlobal
            | Self::DefineGlobal
            | Self::SetGlobal => 1,
            Self::Jump | Self::JumpIfFalse | Self::Loop => 2,
            _ => 0,
        }
    }

    /// Mnemonic used by the disassembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Constant => "OP_CONSTANT",
            Self::Nil => "OP_NIL",
            Self::True => "OP_TRUE",
            Self::False => "OP_FALSE",
            Self::Pop => "OP_POP",
            Self::GetLocal => "OP_GET_LOCAL",
            Self::SetLocal => "OP_SET_LOCAL",
            Self::GetGlobal => "OP_GET_GLOBAL",
            Self::DefineGlobal => "OP_DEFINE_GLOBAL",
            Self::SetGlobal => "OP_SET_GLOBAL",
            Self::Equal => "OP_EQUAL",
            Self::NotEqual => "OP_NOT_EQUAL",
            Self::Greater => "OP_GREATER",
            Self::GreaterEqual => "OP_GREATER_EQUAL",
            Self::Less => "OP_LESS",
            Self::LessEqual => "OP_LESS_EQUAL",
            Self::Add => "OP_ADD",
            Self::Subtract => "OP_SUBTRACT",
            Self::Multiply => "OP_MULTIPLY",
            Self::Divide => "OP_DIVIDE",
            Self::Not => "OP_NOT",
            Self::Negate => "OP_NEGATE",
            Self::Print => "OP_PRINT",
            Self::Jump => "OP_JUMP",
            Self::JumpIfFalse => "OP_JUMP_IF_FALSE",
            Self::Loop => "OP_LOOP",
            Self::Return => "OP_RETURN",
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op.as_byte() }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> { Self::from_byte(byte).ok_or(byte) }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.mnemonic()) }
}

/* ─────────────────────────── Constant pool ─────────────────────────── */

/// Constant pool with stable indices (0-based). Duplicates are allowed.
#[derive(Debug, Clone, Default)]
pub struct ConstPool {
    values: Vec<Value>,
}

impl ConstPool {
    /// Create an empty pool.
    pub const fn new() -> Self { Self { values: Vec::new() } }

    /// Number of stored constants.
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Iterate as `(index, &Value)`.
    pub fn iter(&self) -> ConstIter<'_> { ConstIter { inner: self.values.iter().enumerate() } }

    /// Pushes a value and returns its index.
    pub fn add(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    /// Lookup a constant by index.
    pub fn get(&self, idx: usize) -> Option<Value> { self.values.get(idx).copied() }
}

/// Iterator returned by [`ConstPool::iter`].
pub struct ConstIter<'a> {
    inner: Enumerate<slice::Iter<'a, Value>>,
}

impl<'a> Iterator for ConstIter<'a> {
    type Item = (usize, &'a Value);

    fn next(&mut self) -> Option<Self::Item> { self.inner.next() }
}

impl<'a> IntoIterator for &'a ConstPool {
    type Item = (usize, &'a Value);
    type IntoIter = ConstIter<'a>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/* ─────────────────────────── Line table ─────────────────────────── */

/// Line table (byte offset → source line), one entry per code byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    lines: Vec<u32>,
}

impl LineTable {
    /// Create an empty line table.
    pub const fn new() -> Self { Self { lines: Vec::new() } }
    /// Append the line of the next code byte.
    pub fn push(&mut self, line: u32) { self.lines.push(line); }
    /// Number of stored line entries.
    pub fn len(&self) -> usize { self.lines.len() }
    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    /// Resolve the source line associated with a byte offset (0 when unknown).
    pub fn line_for_offset(&self, offset: usize) -> u32 { self.lines.get(offset).copied().unwrap_or_default() }
    /// Underlying entries.
    pub fn as_slice(&self) -> &[u32] { &self.lines }

    fn reserve_exact(&mut self, additional: usize) { self.lines.reserve_exact(additional); }
}

/* ─────────────────────────── Chunk ─────────────────────────── */

/// A unit of compiled code: instruction bytes, the source line of every
/// byte and the constants referenced by `Constant` and the global opcodes.
///
/// Filled by the compiler, then only read by the VM.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    code: Vec<u8>,
    /// Mapping between byte offsets and source lines.
    pub lines: LineTable,
    /// Constant pool associated with the chunk.
    pub consts: ConstPool,
}

impl Chunk {
    /// Create an empty chunk.
    pub const fn new() -> Self { Self { code: Vec::new(), lines: LineTable::new(), consts: ConstPool::new() } }

    /// Append one byte and record its source line.
    pub fn write(&mut self, byte: u8, line: u32) {
        if self.code.len() == self.code.capacity() {
            let additional = grow_capacity(self.code.capacity()) - self.code.len();
            self.code.reserve_exact(additional);
            self.lines.reserve_exact(additional);
        }
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode byte.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op.as_byte(), line); }

    /// Append a constant and return its index. The caller enforces
    /// [`CONSTANTS_MAX`] since only it knows how to report the overflow.
    pub fn add_constant(&mut self, value: Value) -> usize { self.consts.add(value) }

    /// Number of code bytes.
    pub fn len(&self) -> usize { self.code.len() }

    /// Whether no byte was written yet.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }

    /// Current byte capacity (follows [`grow_capacity`]).
    pub fn capacity(&self) -> usize { self.code.capacity() }

    /// Raw code bytes.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Byte at `offset`, if any.
    pub fn byte_at(&self, offset: usize) -> Option<u8> { self.code.get(offset).copied() }

    /// Source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> u32 { self.lines.line_for_offset(offset) }

    /// Big-endian `u16` operand at `offset`.
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        match self.code.get(offset..offset + 2) {
            Some(&[hi, lo]) => Some(u16::from_be_bytes([hi, lo])),
            _ => None,
        }
    }

    /// Overwrite a previously emitted `u16` operand (jump patching).
    ///
    /// Returns `false` when `offset` does not address two written bytes.
    pub fn patch_u16(&mut self, offset: usize, value: u16) -> bool {
        match self.code.get_mut(offset..offset + 2) {
            Some(slot) => {
                slot.copy_from_slice(&value.to_be_bytes());
                true
            }
            None => false,
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
