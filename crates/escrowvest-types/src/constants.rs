//! System-wide constants for the escrowvest vesting escrow.

/// Days after creation at which the second tranche unlocks.
pub const SECOND_UNLOCK_DAYS: i64 = 90;

/// Days after creation at which the third tranche unlocks.
pub const THIRD_UNLOCK_DAYS: i64 = 180;

/// Share of the settlement paid by the first tranche, in percent.
pub const FIRST_TRANCHE_PCT: u32 = 50;

/// Share of the settlement paid by the second tranche, in percent.
pub const SECOND_TRANCHE_PCT: u32 = 25;

/// Share of the settlement paid by the third tranche, in percent.
pub const THIRD_TRANCHE_PCT: u32 = 25;

/// Upper bound on a settlement amount in smallest units (10^27).
///
/// Keeps `amount * 50` inside the 96-bit `Decimal` mantissa.
pub const MAX_SETTLEMENT_AMOUNT: i128 = 1_000_000_000_000_000_000_000_000_000;

/// Domain separator for the event journal hash chain.
pub const JOURNAL_DOMAIN: &[u8] = b"escrowvest:journal:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "escrowvest";
