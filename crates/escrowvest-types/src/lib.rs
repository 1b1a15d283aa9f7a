//! # escrowvest-types
//!
//! Shared types, errors, and configuration for the **escrowvest**
//! three-party vesting escrow.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`SettlementId`], [`AssetId`]
//! - **Parties**: [`Role`], [`Parties`]
//! - **Vesting model**: [`Tranche`], [`ClaimStage`], [`Amount`]
//! - **Events**: [`SettlementEvent`]
//! - **Status**: [`SettlementStatus`]
//! - **Configuration**: [`SettlementConfig`]
//! - **Errors**: [`EscrowError`] with `EV_ERR_` prefix codes
//! - **Constants**: unlock offsets, tranche percentages, limits

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod party;
pub mod status;
pub mod tranche;

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use party::*;
pub use status::*;
pub use tranche::*;

// Constants are accessed via `escrowvest_types::constants::FOO`
// (not re-exported to avoid name collisions).
