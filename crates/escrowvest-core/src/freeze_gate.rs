//! Arbiter freeze gate.
//!
//! While frozen, `fund` and `withdraw` are blocked so a dispute can be
//! resolved before any more value moves. Arbiter operations never consult
//! the gate.

use escrowvest_types::{EscrowError, Result};

/// Freeze flag toggled by the arbiter.
///
/// Freezing an already frozen gate (or unfreezing an open one) is a no-op,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreezeGate {
    frozen: bool,
}

impl FreezeGate {
    /// A gate that starts open.
    #[must_use]
    pub fn new() -> Self {
        Self { frozen: false }
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Guard a fund or withdraw attempt. Returns `Ok(())` if open,
    /// or [`EscrowError::Frozen`] if the arbiter froze the settlement.
    pub fn check_open(&self) -> Result<()> {
        if self.frozen {
            Err(EscrowError::Frozen)
        } else {
            Ok(())
        }
    }
}
