//! Structural validation of a chunk before execution.

use crate::{
    bytecode::chunk::{Chunk, OpCode},
    CoreError, CoreResult,
};

#[cfg(not(feature = "std"))]
use alloc::format;

/// Basic structural validation of a chunk.
///
/// Checks that the line table covers every byte, that each opcode decodes
/// with its operands in bounds, that constant operands exist and that jumps
/// land inside the code. It does not simulate the stack.
pub fn validate_chunk(chunk: &Chunk) -> CoreResult<()> {
    if chunk.len() != chunk.lines.len() {
        return Err(CoreError::corrupted(format!(
            "line table has {} entries for {} code bytes",
            chunk.lines.len(),
            chunk.len()
        )));
    }

    let mut offset = 0;
    while offset < chunk.len() {
        let byte = chunk.byte_at(offset).unwrap_or_default();
        let op = OpCode::from_byte(byte).ok_or(CoreError::UnknownOpcode { byte, offset })?;
        let next = offset + 1 + op.operand_width();
        if next > chunk.len() {
            return Err(CoreError::TruncatedInstruction { offset });
        }

        match op {
            OpCode::Constant | OpCode::GetGlobal | OpCode::DefineGlobal | OpCode::SetGlobal => {
                let index = usize::from(chunk.byte_at(offset + 1).unwrap_or_default());
                if index >= chunk.consts.len() {
                    return Err(CoreError::ConstantOutOfRange { index, len: chunk.consts.len() });
                }
            }
            OpCode::Jump | OpCode::JumpIfFalse | OpCode::Loop => {
                let distance = usize::from(chunk.read_u16(offset + 1).unwrap_or_default());
                let backward = op == OpCode::Loop;
                let target = if backward { next.checked_sub(distance) } else { next.checked_add(distance) };
                if !target.is_some_and(|t| t <= chunk.len()) {
                    return Err(CoreError::JumpOutOfRange { offset, target: signed_target(next, distance, backward) });
                }
            }
            _ => {}
        }
        offset = next;
    }

    Ok(())
}

/// Jump target as a signed offset, for error reports.
fn signed_target(from: usize, distance: usize, backward: bool) -> isize {
    let from = isize::try_from(from).unwrap_or(isize::MAX);
    let distance = isize::try_from(distance).unwrap_or(isize::MAX);
    if backward { from.saturating_sub(distance) } else { from.saturating_add(distance) }
}
