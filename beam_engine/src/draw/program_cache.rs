/// Last-bound program cache
///
/// Single slot owned by the engine. The draw binder asks it to bind a
/// program and the device call is skipped when that program is already
/// current.

use crate::graphics_device::{GraphicsDevice, ProgramHandle};
use crate::engine_trace;

/// Remembers the program bound by the last draw
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgramStateCache {
    current: Option<ProgramHandle>,
}

impl ProgramStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `program` unless it is already current; returns whether a bind was issued
    pub fn bind_if_changed(&mut self, device: &mut dyn GraphicsDevice, program: ProgramHandle) -> bool {
        if self.current == Some(program) {
            return false;
        }
        device.use_program(Some(program));
        self.current = Some(program);
        engine_trace!("beam::DrawBinder", "Bound program {:?}", program);
        true
    }

    /// Forget the current program so the next draw binds again
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<ProgramHandle> {
        self.current
    }
}

#[cfg(test)]
#[path = "program_cache_tests.rs"]
mod tests;
