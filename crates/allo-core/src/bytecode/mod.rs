//! Bytecode primitives: the chunk container, its opcodes, structural
//! validation and a textual disassembler for diagnostics.

/// Chunk representation (code bytes, line table, constant pool).
pub mod chunk;
pub mod disasm;
pub mod helpers;

pub use chunk::{grow_capacity, Chunk, ConstPool, LineTable, OpCode, CONSTANTS_MAX};
