//! # escrowvest-custody
//!
//! The fungible-asset custody collaborator the escrow moves funds through.
//!
//! ## Architecture
//!
//! 1. **AssetCustody**: the transfer primitive the escrow depends on
//!    (`transfer`, `transfer_from`, `balance_of`). Every call either fully
//!    succeeds or leaves all balances untouched.
//! 2. **InMemoryLedger**: per-(holder, asset) balances plus ERC-20 style
//!    allowances.
//! 3. **SupplyConservation**: tracks minted supply per asset and checks
//!    that transfers never create or destroy units.

pub mod custody;
pub mod ledger;
pub mod supply_conservation;

pub use custody::AssetCustody;
pub use ledger::InMemoryLedger;
pub use supply_conservation::SupplyConservation;
