//! In-memory custody ledger.
//!
//! Tracks per-(holder, asset) balances and per-(owner, spender, asset)
//! allowances. All mutations are atomic: every check runs before the
//! first write, so a rejected transfer leaves the ledger unchanged.

use std::collections::HashMap;

use escrowvest_types::{AccountId, Amount, AssetId, EscrowError, Result};
use rust_decimal::Decimal;

use crate::custody::AssetCustody;
use crate::supply_conservation::SupplyConservation;

/// Ledger of fungible balances with allowance-based delegated transfers.
pub struct InMemoryLedger {
    balances: HashMap<(AccountId, AssetId), Amount>,
    /// Keyed by (owner, spender, asset).
    allowances: HashMap<(AccountId, AccountId, AssetId), Amount>,
    supply: SupplyConservation,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            allowances: HashMap::new(),
            supply: SupplyConservation::new(),
        }
    }

    /// Issue new units of `asset` to `holder`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` for negative or fractional amounts and
    /// `BalanceOverflow` when the holder balance or the asset supply would
    /// exceed `Decimal::MAX`.
    pub fn mint(&mut self, holder: AccountId, asset: &AssetId, amount: Amount) -> Result<()> {
        check_amount(amount)?;
        let credited = credit(asset, self.balance_of(asset, holder), amount)?;
        self.supply.record_mint(asset, amount)?;
        self.balances.insert((holder, asset.clone()), credited);
        tracing::debug!(holder = %holder, asset = %asset, %amount, "Minted");
        Ok(())
    }

    /// Set the amount `spender` may move out of `owner` via `transfer_from`.
    ///
    /// # Errors
    /// Returns `InvalidAmount` for negative or fractional amounts.
    pub fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<()> {
        check_amount(amount)?;
        self.allowances
            .insert((owner, spender, asset.clone()), amount);
        Ok(())
    }

    /// Remaining allowance `owner` has granted `spender`.
    #[must_use]
    pub fn allowance(&self, owner: AccountId, spender: AccountId, asset: &AssetId) -> Amount {
        self.allowances
            .get(&(owner, spender, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of all holder balances of `asset`.
    #[must_use]
    pub fn total_supply(&self, asset: &AssetId) -> Amount {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, bal)| *bal)
            .sum()
    }

    /// Check that no transfer has created or destroyed units of `asset`.
    pub fn verify_supply(&self, asset: &AssetId) -> Result<()> {
        self.supply.verify(asset, self.total_supply(asset))
    }

    /// Check supply conservation for every asset ever minted.
    pub fn verify_all_supplies(&self) -> Result<()> {
        self.supply
            .tracked_assets()
            .iter()
            .try_for_each(|asset| self.verify_supply(asset))
    }

    /// Debit `from` and credit `to`. Both new balances are computed before
    /// either is written.
    fn move_funds(
        &mut self,
        asset: &AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        let available = self.balance_of(asset, from);
        let debited = available
            .checked_sub(amount)
            .filter(|rest| *rest >= Decimal::ZERO)
            .ok_or_else(|| EscrowError::InsufficientBalance {
                asset: asset.clone(),
                needed: amount,
                available,
            })?;
        if from != to {
            let credited = credit(asset, self.balance_of(asset, to), amount)?;
            self.balances.insert((from, asset.clone()), debited);
            self.balances.insert((to, asset.clone()), credited);
        }
        tracing::debug!(from = %from.short(), to = %to.short(), asset = %asset, %amount, "Transferred");
        Ok(())
    }
}

impl AssetCustody for InMemoryLedger {
    fn balance_of(&self, asset: &AssetId, holder: AccountId) -> Amount {
        self.balances
            .get(&(holder, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        check_amount(amount)?;
        self.move_funds(asset, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        check_amount(amount)?;
        let approved = self.allowance(from, spender, asset);
        if approved < amount {
            return Err(EscrowError::InsufficientAllowance {
                asset: asset.clone(),
                needed: amount,
                approved,
            });
        }
        self.move_funds(asset, from, to, amount)?;
        self.allowances
            .insert((from, spender, asset.clone()), approved - amount);
        Ok(())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn credit(asset: &AssetId, balance: Amount, amount: Amount) -> Result<Amount> {
    balance
        .checked_add(amount)
        .ok_or_else(|| EscrowError::BalanceOverflow {
            asset: asset.clone(),
            amount,
        })
}

fn check_amount(amount: Amount) -> Result<()> {
    if amount.is_sign_negative() || !amount.fract().is_zero() {
        return Err(EscrowError::InvalidAmount(amount));
    }
    Ok(())
}
