//! allo-core: primitives partagées (no_std-ready)
//!
//! Fournit :
//! - `SourceId`, `Pos`, `Span`
//! - `Chunk` (octets + table des lignes + pool de constantes) et `OpCode`
//! - `Value` (nil / booléen / nombre / référence d'objet)
//! - `Heap` : arène d'objets (chaînes) possédée par la VM, libérée en bloc
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `std` (par défaut) : impl `std::error::Error` & tests
//! - `serde` : derive (dé)sérialisation sur les structures utiles

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;

#[cfg(feature = "std")]
use std::borrow::Cow;

#[cfg(not(feature = "std"))]
use alloc::borrow::Cow;

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Primitives de bytecode (chunk, désassembleur, validation).
pub mod bytecode;
/// Tas d'objets et références.
pub mod object;
/// Valeurs manipulées par la VM.
pub mod value;

/// Raccourci : helpers de validation.
pub use bytecode::helpers;
/// Raccourci : désassembleur textuel.
pub use bytecode::disasm;

pub use bytecode::{Chunk, ConstPool, LineTable, OpCode};
pub use object::{Heap, Obj, ObjRef, ObjString};
pub use value::Value;

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Spans / Positions ─────────────────────────── */

/// Identifiant de source (fichier, buffer, ligne de REPL…).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceId(pub u32);

/// Position (offset byte) depuis le début de la source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pos(pub u32);

impl Pos {
    /// Position nulle.
    pub const ZERO: Self = Self(0);
}

/// Plage (demi-ouverte) `[start, end)` dans une source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    /// Source d’où provient l’item.
    pub source: SourceId,
    /// Début inclus.
    pub start: Pos,
    /// Fin exclue.
    pub end: Pos,
}

impl Span {
    /// Crée un span.
    pub const fn new(source: SourceId, start: Pos, end: Pos) -> Self { Self { source, start, end } }
    /// Longueur en bytes.
    pub const fn len(&self) -> u32 { self.end.0.saturating_sub(self.start.0) }
    /// Vrai si le span est vide.
    pub const fn is_empty(&self) -> bool { self.start.0 >= self.end.0 }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs structurelles détectées sur un chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Octet qui ne correspond à aucun opcode.
    UnknownOpcode {
        /// Octet lu.
        byte: u8,
        /// Offset de l'octet dans le code.
        offset: usize,
    },
    /// Instruction coupée par la fin du code (opérande manquant).
    TruncatedInstruction {
        /// Offset de l'opcode tronqué.
        offset: usize,
    },
    /// Index de constante hors du pool.
    ConstantOutOfRange {
        /// Index demandé.
        index: usize,
        /// Taille du pool.
        len: usize,
    },
    /// Cible de saut en dehors du code.
    JumpOutOfRange {
        /// Offset de l'instruction de saut.
        offset: usize,
        /// Cible calculée (peut être négative pour `Loop`).
        target: isize,
    },
    /// Données incohérentes (message libre).
    Corrupted(Cow<'static, str>),
}

impl CoreError {
    /// Construit une erreur `Corrupted` à partir d'un message.
    pub fn corrupted<M: Into<Cow<'static, str>>>(msg: M) -> Self { Self::Corrupted(msg.into()) }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { byte, offset } => write!(f, "unknown opcode 0x{byte:02X} at offset {offset}"),
            Self::TruncatedInstruction { offset } => write!(f, "truncated instruction at offset {offset}"),
            Self::ConstantOutOfRange { index, len } => {
                write!(f, "constant index {index} out of range (pool size {len})")
            }
            Self::JumpOutOfRange { offset, target } => {
                write!(f, "jump at offset {offset} lands outside the code (target {target})")
            }
            Self::Corrupted(msg) => write!(f, "corrupted: {msg}"),
        }
    }
}

/// Implémente `std::error::Error` uniquement avec la feature `std`.
#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/* ─────────────────────────── Tests ─────────────────────────── */
