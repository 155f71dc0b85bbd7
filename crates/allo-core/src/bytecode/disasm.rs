//! Textual disassembly used by `--print-code` and execution tracing.

use crate::bytecode::chunk::{Chunk, OpCode};
use crate::object::Heap;

#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(feature = "std")]
use std::string::String;

use core::fmt::Write;

/// Produce a multi-line, human readable disassembly of the whole chunk.
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {title} ==");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, heap, offset, &mut out);
    }
    out
}

/// Append one instruction (without trailing newline handling by the caller)
/// and return the offset of the next one.
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize, out: &mut String) -> usize {
    let _ = write!(out, "{offset:04} ");
    let line = chunk.line_at(offset);
    if offset > 0 && line == chunk.line_at(offset - 1) {
        let _ = write!(out, "   | ");
    } else {
        let _ = write!(out, "{line:4} ");
    }

    let Some(byte) = chunk.byte_at(offset) else {
        let _ = writeln!(out, "<end of code>");
        return offset + 1;
    };
    let Some(op) = OpCode::from_byte(byte) else {
        let _ = writeln!(out, "Unknown opcode {byte}");
        return offset + 1;
    };

    match op.operand_width() {
        1 => {
            let Some(operand) = chunk.byte_at(offset + 1) else {
                let _ = writeln!(out, "{op} <truncated>");
                return chunk.len();
            };
            match op {
                OpCode::GetLocal | OpCode::SetLocal => {
                    let _ = writeln!(out, "{:<16} {operand:4}", op.mnemonic());
                }
                _ => {
                    let _ = write!(out, "{:<16} {operand:4} '", op.mnemonic());
                    match chunk.consts.get(usize::from(operand)) {
                        Some(value) => {
                            let _ = write!(out, "{}", heap.display(value));
                        }
                        None => {
                            let _ = write!(out, "<bad constant>");
                        }
                    }
                    let _ = writeln!(out, "'");
                }
            }
            offset + 2
        }
        2 => {
            let Some(jump) = chunk.read_u16(offset + 1) else {
                let _ = writeln!(out, "{op} <truncated>");
                return chunk.len();
            };
            let next = offset + 3;
            let target = if op == OpCode::Loop {
                next.checked_sub(usize::from(jump))
            } else {
                Some(next + usize::from(jump))
            };
            match target {
                Some(t) => {
                    let _ = writeln!(out, "{:<16} {offset:4} -> {t}", op.mnemonic());
                }
                None => {
                    let _ = writeln!(out, "{:<16} {offset:4} -> <before start>", op.mnemonic());
                }
            }
            next
        }
        _ => {
            let _ = writeln!(out, "{}", op.mnemonic());
            offset + 1
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
