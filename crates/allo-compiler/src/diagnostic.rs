//! Compile-time diagnostics.

use std::fmt;

use thiserror::Error;

/// Where an error points in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At the end of input (`Eof`).
    AtEnd,
    /// At a given lexeme.
    At(String),
    /// Reported by the scanner: the message already describes the spot.
    Lexical,
}

/// One compile error, rendered as `[line N] Error<location>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source line of the offending token.
    pub line: u32,
    /// Location marker.
    pub location: ErrorLocation,
    /// Human message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;
        match &self.location {
            ErrorLocation::AtEnd => f.write_str(" at end")?,
            ErrorLocation::At(lexeme) => write!(f, " at '{lexeme}'")?,
            ErrorLocation::Lexical => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Failed compilation, with every diagnostic reported before recovery gave up.
#[derive(Debug, Clone, Error)]
#[error("compilation failed with {} error(s)", .diagnostics.len())]
pub struct CompileError {
    /// Accumulated diagnostics, in report order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    /// Diagnostics rendered one per line.
    pub fn render(&self) -> String {
        self.diagnostics.iter().map(|d| format!("{d}\n")).collect()
    }
}
