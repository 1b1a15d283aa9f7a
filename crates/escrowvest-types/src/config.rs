//! Settlement configuration.
//!
//! The vesting schedule itself is fixed (see [`crate::constants`]); a
//! configuration only names the parties, the asset and the amount.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetId, EscrowError, Parties, Result, constants};

/// Parameters fixed at settlement creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Party that funds the escrow.
    pub sender: AccountId,
    /// Party that vests the funds.
    pub receiver: AccountId,
    /// Party with freeze and recovery powers.
    pub arbiter: AccountId,
    /// The asset custodied and paid out.
    pub asset: AssetId,
    /// Total owed to the receiver, in smallest units.
    pub amount: Amount,
}

impl SettlementConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// The party triple.
    #[must_use]
    pub fn parties(&self) -> Parties {
        Parties {
            sender: self.sender,
            receiver: self.receiver,
            arbiter: self.arbiter,
        }
    }

    /// Reject configurations no settlement should be created from.
    ///
    /// # Errors
    /// Returns [`EscrowError::Configuration`] when the amount is not a
    /// positive whole number within [`constants::MAX_SETTLEMENT_AMOUNT`],
    /// the asset symbol is blank, or two roles share an account.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(EscrowError::Configuration(format!(
                "settlement amount must be > 0, got {}",
                self.amount
            )));
        }
        if !self.amount.fract().is_zero() {
            return Err(EscrowError::Configuration(format!(
                "settlement amount must be whole smallest units, got {}",
                self.amount
            )));
        }
        if self.amount > Decimal::from_i128_with_scale(constants::MAX_SETTLEMENT_AMOUNT, 0) {
            return Err(EscrowError::Configuration(format!(
                "settlement amount {} exceeds maximum {}",
                self.amount,
                constants::MAX_SETTLEMENT_AMOUNT
            )));
        }
        if self.asset.symbol().trim().is_empty() {
            return Err(EscrowError::Configuration(
                "settlement asset symbol is empty".into(),
            ));
        }
        if !self.parties().are_distinct() {
            return Err(EscrowError::Configuration(
                "sender, receiver and arbiter must be distinct accounts".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl SettlementConfig {
    /// Fresh parties, USDC, the given amount.
    pub fn dummy(amount: Amount) -> Self {
        Self {
            sender: AccountId::new(),
            receiver: AccountId::new(),
            arbiter: AccountId::new(),
            asset: AssetId::new("USDC"),
            amount,
        }
    }
}
