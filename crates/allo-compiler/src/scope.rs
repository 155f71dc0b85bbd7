//! Compile-time tracking of local variables.

/// Maximum number of locals alive at once (slot operand is a `u8`).
pub const LOCALS_MAX: usize = u8::MAX as usize + 1;

/// A declared local. `depth` is `None` between declaration and the end of
/// its initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Local<'src> {
    pub name: &'src str,
    pub depth: Option<u32>,
}

/// Outcome of a name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Local(u8),
    /// Found, but still inside its own initializer.
    Uninitialized(u8),
    Global,
}

#[derive(Debug, Default)]
pub struct Scope<'src> {
    locals: Vec<Local<'src>>,
    depth: u32,
}

impl<'src> Scope<'src> {
    pub const fn is_global(&self) -> bool { self.depth == 0 }

    pub fn begin(&mut self) { self.depth += 1; }

    /// Leaves the innermost block; returns how many locals went out of scope.
    pub fn end(&mut self) -> usize {
        self.depth = self.depth.saturating_sub(1);
        let depth = self.depth;
        let keep = self
            .locals
            .iter()
            .rposition(|l| l.depth.is_some_and(|d| d <= depth))
            .map_or(0, |i| i + 1);
        let dropped = self.locals.len() - keep;
        self.locals.truncate(keep);
        dropped
    }

    /// Whether `name` is already declared in the innermost block.
    pub fn declared_here(&self, name: &str) -> bool {
        self.locals
            .iter()
            .rev()
            .take_while(|l| l.depth.map_or(true, |d| d >= self.depth))
            .any(|l| l.name == name)
    }

    /// Declares an uninitialized local. `false` when the slots are exhausted.
    pub fn add(&mut self, name: &'src str) -> bool {
        if self.locals.len() >= LOCALS_MAX {
            return false;
        }
        self.locals.push(Local { name, depth: None });
        true
    }

    pub fn mark_initialized(&mut self) {
        let depth = self.depth;
        if let Some(last) = self.locals.last_mut() {
            last.depth = Some(depth);
        }
    }

    /// Innermost-first lookup.
    pub fn resolve(&self, name: &str) -> Resolution {
        for (slot, local) in self.locals.iter().enumerate().rev() {
            if local.name == name {
                let slot = u8::try_from(slot).unwrap_or(u8::MAX);
                return match local.depth {
                    Some(_) => Resolution::Local(slot),
                    None => Resolution::Uninitialized(slot),
                };
            }
        }
        Resolution::Global
    }
}
