// src/lib.rs
//! Allo Compiler - compilation en une passe, source → bytecode
//!
//! - Entrée : un flux de jetons (`allo_lexer::TokenSource`), tiré à la demande
//! - Sortie : un `allo_core::Chunk` prêt pour la VM
//! - Analyse : descente récursive + précédence d'opérateurs (Pratt), avec le
//!   drapeau `can_assign` pour rejeter `a + b = c`
//! - Portées : locales résolues à la compilation (slots de pile), globales par nom
//! - Diagnostics : collectés, avec récupération en « panic mode » jusqu'à la
//!   prochaine frontière d'instruction
//!
//! Features :
//! - `std` (par défaut)
//! - `serde` (pour sérialiser `CompilerOptions`)
//!
//! API principale :
//! ```
//! use allo_compiler::compile;
//! use allo_core::Heap;
//!
//! let mut heap = Heap::new();
//! let chunk = compile("print 1 + 2;", &mut heap).expect("valid program");
//! assert!(!chunk.is_empty());
//!
//! let err = compile("print ;", &mut heap).unwrap_err();
//! assert_eq!(err.diagnostics[0].to_string(), "[line 1] Error at ';': Expect expression.");
//! ```

#![deny(missing_docs)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use allo_core::{Chunk, Heap};
use allo_lexer::Scanner;

mod compiler;
mod diagnostic;
mod rules;
mod scope;

pub use compiler::{Compiler, NESTING_MAX};
pub use diagnostic::{CompileError, Diagnostic, ErrorLocation};
pub use scope::LOCALS_MAX;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options du compilateur
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompilerOptions {
    /// Journaliser le désassemblage du chunk produit (cible `allo::code`, niveau debug)
    pub print_code: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Façade
// ─────────────────────────────────────────────────────────────────────────────

/// Compile une source avec les options par défaut.
///
/// # Errors
/// `CompileError` avec tous les diagnostics si la source est invalide.
pub fn compile(source: &str, heap: &mut Heap) -> Result<Chunk, CompileError> {
    compile_with(source, heap, CompilerOptions::default())
}

/// Compile une source avec des options explicites.
///
/// # Errors
/// `CompileError` avec tous les diagnostics si la source est invalide.
pub fn compile_with(source: &str, heap: &mut Heap, options: CompilerOptions) -> Result<Chunk, CompileError> {
    Compiler::new(Scanner::new(source), heap, options).compile()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests basiques
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use allo_core::disasm::disassemble_chunk;

    #[test]
    fn facade_compiles_and_disassembles() {
        let mut heap = Heap::new();
        let chunk = compile("var greeting = \"hi\";\nprint greeting;", &mut heap).expect("compiles");
        insta::assert_snapshot!(disassemble_chunk(&chunk, &heap, "script"), @r###"
        == script ==
        0000    1 OP_CONSTANT         1 'hi'
        0002    | OP_DEFINE_GLOBAL    0 'greeting'
        0004    2 OP_GET_GLOBAL       2 'greeting'
        0006    | OP_PRINT
        0007    | OP_RETURN
        "###);
    }

    #[test]
    fn failed_compile_yields_no_chunk() {
        let mut heap = Heap::new();
        let err = compile_with("var;", &mut heap, CompilerOptions { print_code: true }).unwrap_err();
        assert_eq!(err.diagnostics.len(), 1);
        assert_eq!(err.diagnostics[0].location, ErrorLocation::At(";".into()));
    }
}
