//! Error types for the escrowvest settlement escrow.
//!
//! All errors use the `EV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization errors
//! - 2xx: Funding / lifecycle errors
//! - 3xx: Vesting schedule errors
//! - 4xx: Asset / custody errors
//! - 8xx: Invariant errors
//! - 9xx: General errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, AssetId, Role};

/// Central error enum for all escrowvest operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller is not the party designated for this operation.
    #[error("EV_ERR_100: Unauthorized: {caller} is not the {required}")]
    Unauthorized { required: Role, caller: AccountId },

    // =================================================================
    // Funding / Lifecycle Errors (2xx)
    // =================================================================
    /// The arbiter has frozen the settlement; fund and withdraw are blocked.
    #[error("EV_ERR_200: Settlement is frozen by the arbiter")]
    Frozen,

    /// `fund` was already executed once.
    #[error("EV_ERR_201: Settlement already funded")]
    AlreadyFunded,

    /// `withdraw` was called before the sender funded the settlement.
    #[error("EV_ERR_202: Settlement not funded")]
    NotFunded,

    // =================================================================
    // Vesting Schedule Errors (3xx)
    // =================================================================
    /// The next pending tranche has not unlocked yet.
    #[error("EV_ERR_300: Claim window not open")]
    ClaimWindowNotOpen,

    /// All three tranches have been claimed.
    #[error("EV_ERR_301: Settlement fully claimed")]
    FullyClaimed,

    // =================================================================
    // Asset / Custody Errors (4xx)
    // =================================================================
    /// The settlement asset cannot leave through the foreign-asset path.
    #[error("EV_ERR_400: Invalid asset for this operation: {0}")]
    InvalidAsset(AssetId),

    /// The custody transfer was rejected. State is unchanged.
    #[error("EV_ERR_401: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// Holder balance too small for the requested transfer.
    #[error("EV_ERR_402: Insufficient balance of {asset}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        needed: Decimal,
        available: Decimal,
    },

    /// Spender allowance too small for the requested `transfer_from`.
    #[error("EV_ERR_403: Insufficient allowance of {asset}: need {needed}, approved {approved}")]
    InsufficientAllowance {
        asset: AssetId,
        needed: Decimal,
        approved: Decimal,
    },

    /// Transfer amount is negative or not a whole number of smallest units.
    #[error("EV_ERR_404: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Crediting `amount` would exceed the representable balance or supply.
    #[error("EV_ERR_405: Balance overflow of {asset}: cannot add {amount}")]
    BalanceOverflow { asset: AssetId, amount: Decimal },

    // =================================================================
    // Invariant Errors (8xx)
    // =================================================================
    /// Custody balance no longer matches the escrow's bookkeeping.
    #[error("EV_ERR_800: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// The event journal hash chain does not verify.
    #[error("EV_ERR_801: Journal chain broken at sequence {sequence}")]
    JournalChainBroken { sequence: u64 },

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("EV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("EV_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("EV_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<std::io::Error> for EscrowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EscrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
