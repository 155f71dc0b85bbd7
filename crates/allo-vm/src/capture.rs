//! In-memory writer used to capture program output.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

/// Petit writer qui **capture** la sortie dans une String (utile en tests/REPL).
#[derive(Debug, Default, Clone)]
pub struct Captured(Arc<Mutex<String>>);

impl Captured {
    /// Récupère le buffer (copie).
    pub fn get(&self) -> String { self.0.lock().unwrap_or_else(PoisonError::into_inner).clone() }
    /// Récupère le buffer et le vide.
    pub fn take(&self) -> String { std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner)) }
    /// Réinitialise le buffer.
    pub fn clear(&self) { self.0.lock().unwrap_or_else(PoisonError::into_inner).clear(); }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push_str(&s);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
