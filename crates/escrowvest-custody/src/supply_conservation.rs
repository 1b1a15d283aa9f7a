//! Supply conservation invariant checker.
//!
//! Invariant enforced by the ledger:
//! ```text
//! ∀ asset: Σ balances == Σ minted
//! ```
//!
//! Transfers move units between holders and never change the total. If the
//! sum of balances ever drifts from the minted total, the ledger is broken.

use std::collections::HashMap;

use escrowvest_types::{Amount, AssetId, EscrowError, Result};
use rust_decimal::Decimal;

/// Tracks per-asset minted totals.
pub struct SupplyConservation {
    minted: HashMap<AssetId, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            minted: HashMap::new(),
        }
    }

    /// Record newly issued units.
    ///
    /// # Errors
    /// Returns [`EscrowError::BalanceOverflow`] if the minted total would
    /// exceed `Decimal::MAX`. The recorded total is unchanged in that case.
    pub fn record_mint(&mut self, asset: &AssetId, amount: Amount) -> Result<()> {
        let total = self
            .expected_supply(asset)
            .checked_add(amount)
            .ok_or_else(|| EscrowError::BalanceOverflow {
                asset: asset.clone(),
                amount,
            })?;
        self.minted.insert(asset.clone(), total);
        Ok(())
    }

    /// Expected total supply for an asset.
    #[must_use]
    pub fn expected_supply(&self, asset: &AssetId) -> Amount {
        self.minted.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Verify that the actual supply (sum of all holder balances) matches
    /// the minted total for `asset`.
    ///
    /// # Errors
    /// Returns [`EscrowError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, asset: &AssetId, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(EscrowError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: actual supply {actual_supply} != minted {expected}"
                ),
            });
        }
        Ok(())
    }

    /// All assets ever minted.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        self.minted.keys().cloned().collect()
    }
}

impl Default for SupplyConservation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> AssetId {
        AssetId::new("USDC")
    }

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        assert_eq!(sc.expected_supply(&usdc()), Decimal::ZERO);
        assert!(sc.verify(&usdc(), Decimal::ZERO).is_ok());
    }

    #[test]
    fn mints_accumulate() {
        let mut sc = SupplyConservation::new();
        sc.record_mint(&usdc(), Decimal::new(1000, 0)).unwrap();
        sc.record_mint(&usdc(), Decimal::new(500, 0)).unwrap();
        assert_eq!(sc.expected_supply(&usdc()), Decimal::new(1500, 0));
    }

    #[test]
    fn verify_fails_when_imbalanced() {
        let mut sc = SupplyConservation::new();
        sc.record_mint(&usdc(), Decimal::new(10, 0)).unwrap();
        let err = sc.verify(&usdc(), Decimal::new(11, 0)).unwrap_err();
        assert!(matches!(err, EscrowError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn multiple_assets_independent() {
        let mut sc = SupplyConservation::new();
        let dai = AssetId::new("DAI");
        sc.record_mint(&usdc(), Decimal::new(5, 0)).unwrap();
        sc.record_mint(&dai, Decimal::new(50_000, 0)).unwrap();
        assert!(sc.verify(&usdc(), Decimal::new(5, 0)).is_ok());
        assert!(sc.verify(&dai, Decimal::new(50_000, 0)).is_ok());
        assert_eq!(sc.tracked_assets().len(), 2);
    }

    #[test]
    fn overflowing_mint_is_rejected() {
        let mut sc = SupplyConservation::new();
        sc.record_mint(&usdc(), Decimal::MAX).unwrap();
        let err = sc.record_mint(&usdc(), Decimal::ONE).unwrap_err();
        assert!(matches!(err, EscrowError::BalanceOverflow { .. }));
        assert_eq!(sc.expected_supply(&usdc()), Decimal::MAX);
    }
}
