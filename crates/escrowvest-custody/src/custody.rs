//! The custody primitive consumed by the settlement escrow.

use escrowvest_types::{AccountId, Amount, AssetId, Result};

/// Moves fungible value between custody accounts.
///
/// Implementations must be atomic per call: on `Err`, no balance or
/// allowance has changed.
pub trait AssetCustody {
    /// Current balance of `asset` held by `holder`.
    fn balance_of(&self, asset: &AssetId, holder: AccountId) -> Amount;

    /// Move `amount` of `asset` out of `from`, which is the acting account.
    fn transfer(
        &mut self,
        asset: &AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()>;

    /// Move `amount` of `asset` out of `from` on behalf of `spender`,
    /// consuming allowance that `from` granted to `spender`.
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()>;
}
