//! VM configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use allo_compiler::CompilerOptions;

use crate::stack::STACK_MAX;

/// Options d'exécution de la VM.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VmOptions {
    /// Trace each instruction with the stack contents (target `allo::exec`, level trace).
    pub trace_execution: bool,
    /// Maximum value-stack depth.
    pub stack_max: usize,
    /// Keep heap objects and globals between two `interpret` calls (REPL).
    pub persistent_globals: bool,
    /// Options passed to the compiler.
    pub compiler: CompilerOptions,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            trace_execution: false,
            stack_max: STACK_MAX,
            persistent_globals: false,
            compiler: CompilerOptions::default(),
        }
    }
}

impl VmOptions {
    /// Options for an interactive session: globals survive between lines.
    pub fn repl() -> Self { Self { persistent_globals: true, ..Self::default() } }
}
