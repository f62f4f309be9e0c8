use parking_lot::RwLock;
use serde::Serialize;
use supervisor_allocation_database::Phase;
use tracing::info;

use crate::caller::Caller;
use crate::error::AdminError;

/// The phase as seen by one operation. Gated operations take this instead of reading a
/// global, so tests can hand in whatever phase they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseContext {
    pub phase: Phase,
    /// Increases with every phase change.
    pub version: u64,
}

impl PhaseContext {
    #[must_use]
    pub const fn new(phase: Phase) -> Self {
        Self { phase, version: 0 }
    }
}

#[derive(Debug)]
pub struct PhaseController {
    current: RwLock<PhaseContext>,
}

impl PhaseController {
    #[must_use]
    pub fn new(initial: Phase) -> Self {
        Self {
            current: RwLock::new(PhaseContext::new(initial)),
        }
    }

    pub fn get_phase(&self) -> Phase {
        self.current.read().phase
    }

    /// Continues from a stored phase and version.
    #[must_use]
    pub fn restore(context: PhaseContext) -> Self {
        Self {
            current: RwLock::new(context),
        }
    }

    pub fn context(&self) -> PhaseContext {
        *self.current.read()
    }

    /// Runs `operation` against the current phase. A phase change waits until it returned, so
    /// whatever `operation` commits was committed in the phase it was handed.
    pub fn gate<T>(&self, operation: impl FnOnce(&PhaseContext) -> T) -> T {
        let current = self.current.read();
        operation(&current)
    }

    /// Moves to any phase, forwards or backwards. Setting the current phase again is a no-op.
    pub fn set_phase(&self, next: Phase, caller: &Caller) -> Result<PhaseContext, AdminError> {
        self.set_phase_after(next, caller, || Ok(()))
    }

    /// Runs `operation` and then moves to `next`, with no gated operation in between. Nothing
    /// changes if the caller isn't an administrator or `operation` fails.
    pub fn set_phase_after(
        &self,
        next: Phase,
        caller: &Caller,
        operation: impl FnOnce() -> Result<(), AdminError>,
    ) -> Result<PhaseContext, AdminError> {
        if !caller.is_administrator() {
            return Err(AdminError::Unauthorized);
        }
        let mut current = self.current.write();
        operation()?;
        if current.phase != next {
            info!(from = %current.phase, to = %next, by = %caller.id, "phase changed");
            current.phase = next;
            current.version += 1;
        }
        Ok(*current)
    }
}
