//! Runtime errors and the three-valued interpretation result.

use std::io;

use allo_core::CoreError;
use thiserror::Error;

/// What went wrong while executing.
#[derive(Debug, Error)]
pub enum RuntimeErrorKind {
    /// Unary operator applied to a non-number.
    #[error("Operand must be a number.")]
    OperandMustBeNumber,

    /// Binary arithmetic/comparison on non-numbers.
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,

    /// Read or assignment of a global that was never defined.
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),

    /// The value stack is full.
    #[error("Stack overflow.")]
    StackOverflow,

    /// An instruction found fewer operands than it needs (malformed bytecode).
    #[error("Stack underflow.")]
    StackUnderflow,

    /// Structurally invalid chunk.
    #[error("Invalid chunk: {0}")]
    InvalidChunk(#[from] CoreError),

    /// Writing program output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// A runtime error tied to the source line of the failing instruction.
///
/// Displays as the message followed by `[line N] in script`.
#[derive(Debug, Error)]
#[error("{kind}\n[line {line}] in script")]
pub struct RuntimeError {
    /// Cause.
    pub kind: RuntimeErrorKind,
    /// Line of the instruction that failed.
    pub line: u32,
}

/// Outcome of running a source or a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    /// Ran to `Return`.
    Ok,
    /// The source did not compile; nothing ran.
    CompileError,
    /// Execution stopped on a runtime error.
    RuntimeError,
}

impl InterpretResult {
    /// Whether the run succeeded.
    pub const fn is_ok(self) -> bool { matches!(self, Self::Ok) }

    /// Process exit code: `0`, `70` for compile errors, `65` for runtime errors.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::CompileError => 70,
            Self::RuntimeError => 65,
        }
    }
}
