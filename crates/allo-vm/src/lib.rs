// src/lib.rs
//! Allo VM - interpréteur de bytecode à pile
//!
//! - Boucle fetch/decode/execute sur un `allo_core::Chunk` validé
//! - Pile de valeurs bornée (`STACK_MAX` par défaut) : débordement = erreur runtime
//! - Globales par nom, locales par slot de pile
//! - Sorties injectables (`print` → stdout, erreurs → stderr), capturables en tests
//! - Traces : cible `allo::exec` (niveau trace) si `trace_execution` est actif
//!
//! Features :
//! - `std` (par défaut)
//! - `serde` (pour sérialiser `VmOptions`)
//!
//! API principale :
//! ```
//! use allo_vm::{InterpretResult, Vm, VmOptions};
//!
//! let (mut vm, out, _err) = Vm::with_captured_output(VmOptions::default());
//! assert_eq!(vm.interpret("var a = 2; print a * 21;"), InterpretResult::Ok);
//! assert_eq!(out.get(), "42\n");
//! ```

#![deny(missing_docs)]

mod capture;
mod error;
mod options;
mod stack;
mod vm;

pub use capture::Captured;
pub use error::{InterpretResult, RuntimeError, RuntimeErrorKind};
pub use options::VmOptions;
pub use stack::{ValueStack, STACK_MAX};
pub use vm::Vm;

/// Compile et exécute `source` dans une VM neuve, sur stdout/stderr.
pub fn interpret(source: &str) -> InterpretResult { Vm::new().interpret(source) }
