//! # escrowvest-core
//!
//! The settlement escrow state machine.
//!
//! ## Architecture
//!
//! A [`SettlementState`] holds one settlement for a fixed sender /
//! receiver / arbiter triple and moves funds through any
//! [`escrowvest_custody::AssetCustody`] implementation:
//! 1. **fund**: sender → custody, full amount, exactly once
//! 2. **withdraw**: custody → receiver, 50% / 25% (> 90 days) / 25% (> 180 days)
//! 3. **freeze / unfreeze**: arbiter gates fund and withdraw via [`FreezeGate`]
//! 4. **recover_funds / recover_foreign_asset**: arbiter overrides
//!
//! Committed changes are appended to a hash-chained [`EventJournal`].
//!
//! ## Call Flow
//!
//! ```text
//! authorize(role) → FreezeGate.check_open() → preconditions
//!     → custody transfer → state update → journal append
//! ```
//!
//! State is only written after the transfer succeeds.

pub mod freeze_gate;
pub mod journal;
pub mod settlement;

pub use freeze_gate::FreezeGate;
pub use journal::{EventJournal, JournalEntry};
pub use settlement::{CallContext, SettlementState};
