//! The settlement state machine.
//!
//! A [`SettlementState`] custodies one settlement amount for a fixed
//! (sender, receiver, arbiter) triple:
//!
//! 1. The sender funds the escrow once with the full amount.
//! 2. The receiver withdraws 50% at once, 25% after 90 days and 25% after
//!    180 days, each strictly after its unlock instant.
//! 3. The arbiter can freeze/unfreeze fund and withdraw, pull the whole
//!    live balance out with `recover_funds`, or sweep assets sent to the
//!    escrow by mistake with `recover_foreign_asset`.
//!
//! Every mutating call either commits fully or returns an error with the
//! state untouched: the custody transfer runs before any flag is written.

use chrono::{DateTime, Utc};
use escrowvest_custody::AssetCustody;
use escrowvest_types::{
    AccountId, Amount, AssetId, ClaimStage, EscrowError, Parties, Result, Role, SettlementConfig,
    SettlementEvent, SettlementId, SettlementStatus, Tranche, constants,
};
use rust_decimal::Decimal;

use crate::freeze_gate::FreezeGate;
use crate::journal::EventJournal;

/// Who is calling and when. The host supplies both for every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub now: DateTime<Utc>,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: AccountId, now: DateTime<Utc>) -> Self {
        Self { caller, now }
    }
}

/// One three-party vesting escrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementState {
    id: SettlementId,
    parties: Parties,
    asset: AssetId,
    amount: Amount,
    /// Ledger account that holds the escrowed funds.
    custody_account: AccountId,
    created_at: DateTime<Utc>,
    second_unlock_at: DateTime<Utc>,
    third_unlock_at: DateTime<Utc>,
    funded: bool,
    gate: FreezeGate,
    stage: ClaimStage,
    /// Settlement-asset units pulled out by `recover_funds`.
    recovered: Amount,
    journal: EventJournal,
}

impl SettlementState {
    /// Create a settlement with a fresh ID.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(config: SettlementConfig, created_at: DateTime<Utc>) -> Result<Self> {
        Self::with_id(SettlementId::new(), config, created_at)
    }

    /// Create a settlement under a caller-chosen ID. The custody account
    /// is derived from the ID.
    pub fn with_id(
        id: SettlementId,
        config: SettlementConfig,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;

        let state = Self {
            id,
            parties: config.parties(),
            asset: config.asset,
            amount: config.amount,
            custody_account: AccountId::custody_for(id),
            created_at,
            second_unlock_at: created_at + chrono::Duration::days(constants::SECOND_UNLOCK_DAYS),
            third_unlock_at: created_at + chrono::Duration::days(constants::THIRD_UNLOCK_DAYS),
            funded: false,
            gate: FreezeGate::new(),
            stage: ClaimStage::None,
            recovered: Decimal::ZERO,
            journal: EventJournal::new(),
        };

        tracing::info!(
            settlement = %state.id,
            asset = %state.asset,
            amount = %state.amount,
            sender = %state.parties.sender,
            receiver = %state.parties.receiver,
            arbiter = %state.parties.arbiter,
            custody = %state.custody_account,
            "Settlement created"
        );
        Ok(state)
    }

    // =================================================================
    // Sender
    // =================================================================

    /// Pull the full settlement amount from the sender into custody.
    ///
    /// The sender must have approved the custody account for at least the
    /// settlement amount.
    ///
    /// # Errors
    /// - `Unauthorized` unless called by the sender
    /// - `Frozen` while the arbiter has frozen the settlement
    /// - `AlreadyFunded` on any call after the first success
    /// - `TransferFailed` if custody rejects the transfer
    pub fn fund<C: AssetCustody>(&mut self, custody: &mut C, call: &CallContext) -> Result<()> {
        self.authorize(Role::Sender, call.caller)?;
        self.check_open()?;
        if self.funded {
            return Err(EscrowError::AlreadyFunded);
        }

        custody
            .transfer_from(
                &self.asset,
                self.custody_account,
                self.parties.sender,
                self.custody_account,
                self.amount,
            )
            .map_err(transfer_failed)?;

        self.funded = true;
        self.journal.append(SettlementEvent::Funded {
            amount: self.amount,
            timestamp: call.now,
        });
        tracing::info!(settlement = %self.id, amount = %self.amount, "Settlement funded");
        Ok(())
    }

    // =================================================================
    // Receiver
    // =================================================================

    /// Claim the next eligible tranche. Returns the amount paid.
    ///
    /// # Errors
    /// - `Unauthorized` unless called by the receiver
    /// - `Frozen` while the arbiter has frozen the settlement
    /// - `NotFunded` before the sender funded
    /// - `ClaimWindowNotOpen` if the next tranche has not unlocked yet
    /// - `FullyClaimed` once all three tranches are paid
    /// - `TransferFailed` if custody rejects the payout (e.g. after `recover_funds`)
    pub fn withdraw<C: AssetCustody>(
        &mut self,
        custody: &mut C,
        call: &CallContext,
    ) -> Result<Amount> {
        self.authorize(Role::Receiver, call.caller)?;
        self.check_open()?;
        if !self.funded {
            return Err(EscrowError::NotFunded);
        }

        let tranche = self.eligible_tranche(call.now)?;
        let payout = tranche.amount_of(self.amount);
        let next_stage = ClaimStage::after(tranche);
        debug_assert!(self.stage.can_transition_to(next_stage));

        custody
            .transfer(
                &self.asset,
                self.custody_account,
                self.parties.receiver,
                payout,
            )
            .map_err(transfer_failed)?;

        self.stage = next_stage;
        self.journal.append(SettlementEvent::Withdrawal {
            amount: payout,
            timestamp: call.now,
        });
        tracing::info!(
            settlement = %self.id,
            %tranche,
            amount = %payout,
            total_claimed = %self.total_claimed(),
            "Tranche withdrawn"
        );
        Ok(payout)
    }

    /// Exactly one branch applies, checked in this order.
    fn eligible_tranche(&self, now: DateTime<Utc>) -> Result<Tranche> {
        if !self.claimed_first() {
            return Ok(Tranche::First);
        }
        if now > self.second_unlock_at && !self.claimed_second() {
            return Ok(Tranche::Second);
        }
        if now > self.third_unlock_at && !self.claimed_third() {
            return Ok(Tranche::Third);
        }
        if self.stage.is_fully_claimed() {
            Err(EscrowError::FullyClaimed)
        } else {
            Err(EscrowError::ClaimWindowNotOpen)
        }
    }

    // =================================================================
    // Arbiter
    // =================================================================

    /// Block fund and withdraw. Allowed in any state, including when
    /// already frozen.
    pub fn freeze(&mut self, call: &CallContext) -> Result<()> {
        self.authorize(Role::Arbiter, call.caller)?;
        self.gate.freeze();
        self.journal.append(SettlementEvent::Frozen {
            timestamp: call.now,
        });
        tracing::info!(settlement = %self.id, "Settlement frozen");
        Ok(())
    }

    /// Lift a freeze. Allowed in any state, including when not frozen.
    pub fn unfreeze(&mut self, call: &CallContext) -> Result<()> {
        self.authorize(Role::Arbiter, call.caller)?;
        self.gate.unfreeze();
        self.journal.append(SettlementEvent::Unfrozen {
            timestamp: call.now,
        });
        tracing::info!(settlement = %self.id, "Settlement unfrozen");
        Ok(())
    }

    /// Move the entire live settlement-asset balance to the arbiter,
    /// bypassing the vesting schedule. Returns the amount moved.
    ///
    /// Neither `funded` nor the claim stage changes, so later withdrawals
    /// hit an empty custody account and fail with `TransferFailed`.
    pub fn recover_funds<C: AssetCustody>(
        &mut self,
        custody: &mut C,
        call: &CallContext,
    ) -> Result<Amount> {
        self.authorize(Role::Arbiter, call.caller)?;

        let balance = custody.balance_of(&self.asset, self.custody_account);
        custody
            .transfer(
                &self.asset,
                self.custody_account,
                self.parties.arbiter,
                balance,
            )
            .map_err(transfer_failed)?;

        self.recovered += balance;
        tracing::info!(
            settlement = %self.id,
            amount = %balance,
            "Arbiter recovered settlement funds"
        );
        Ok(balance)
    }

    /// Sweep `amount` of a non-settlement asset from custody to the arbiter.
    ///
    /// # Errors
    /// - `Unauthorized` unless called by the arbiter
    /// - `InvalidAsset` if `asset` is the settlement asset
    /// - `TransferFailed` if custody rejects the transfer
    pub fn recover_foreign_asset<C: AssetCustody>(
        &mut self,
        custody: &mut C,
        call: &CallContext,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<()> {
        self.authorize(Role::Arbiter, call.caller)?;
        if *asset == self.asset {
            return Err(EscrowError::InvalidAsset(asset.clone()));
        }

        custody
            .transfer(asset, self.custody_account, self.parties.arbiter, amount)
            .map_err(transfer_failed)?;

        tracing::info!(
            settlement = %self.id,
            %asset,
            %amount,
            "Arbiter recovered foreign asset"
        );
        Ok(())
    }

    // =================================================================
    // Projections
    // =================================================================

    /// Time until the next unlock instant, or zero once both have passed.
    #[must_use]
    pub fn time_until_next_unlock(&self, now: DateTime<Utc>) -> chrono::Duration {
        if now < self.second_unlock_at {
            self.second_unlock_at - now
        } else if now < self.third_unlock_at {
            self.third_unlock_at - now
        } else {
            chrono::Duration::zero()
        }
    }

    /// Amount the next unlock is expected to release.
    ///
    /// 50% until the first claim, then 25% until the third unlock instant,
    /// then zero. This looks only at the first claim and the clock, not at
    /// whether the second or third tranche has already been taken, so it
    /// can report 25% while `withdraw` would fail.
    #[must_use]
    pub fn amount_next_unlock(&self, now: DateTime<Utc>) -> Amount {
        if !self.claimed_first() {
            Tranche::First.amount_of(self.amount)
        } else if now < self.third_unlock_at {
            Tranche::Second.amount_of(self.amount)
        } else {
            Decimal::ZERO
        }
    }

    /// Sum of all claimed tranches, each truncated on its own.
    #[must_use]
    pub fn total_claimed(&self) -> Amount {
        self.stage
            .claimed_tranches()
            .map(|t| t.amount_of(self.amount))
            .sum()
    }

    /// Check the custody balance against the escrow's bookkeeping:
    ///
    /// ```text
    /// balance == (funded ? amount : 0) − total_claimed − recovered
    /// ```
    ///
    /// # Errors
    /// Returns [`EscrowError::SupplyInvariantViolation`] on mismatch.
    pub fn check_conservation<C: AssetCustody>(&self, custody: &C) -> Result<()> {
        let actual = custody.balance_of(&self.asset, self.custody_account);
        let expected = self.expected_custody_balance();
        if actual != expected {
            tracing::error!(
                settlement = %self.id,
                %actual,
                %expected,
                "Custody balance diverged from settlement bookkeeping"
            );
            return Err(EscrowError::SupplyInvariantViolation {
                reason: format!(
                    "{}: custody holds {actual} {}, expected {expected} \
                     (funded={}, claimed={}, recovered={})",
                    self.id,
                    self.asset,
                    self.funded,
                    self.total_claimed(),
                    self.recovered,
                ),
            });
        }
        Ok(())
    }

    /// Balance the custody account should hold right now.
    #[must_use]
    pub fn expected_custody_balance(&self) -> Amount {
        let funded = if self.funded {
            self.amount
        } else {
            Decimal::ZERO
        };
        funded - self.total_claimed() - self.recovered
    }

    /// Point-in-time view with every projection evaluated at `now`.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> SettlementStatus {
        SettlementStatus {
            settlement_id: self.id,
            parties: self.parties,
            asset: self.asset.clone(),
            amount: self.amount,
            funded: self.funded,
            frozen: self.gate.is_frozen(),
            claim_stage: self.stage,
            total_claimed: self.total_claimed(),
            amount_next_unlock: self.amount_next_unlock(now),
            seconds_until_next_unlock: self.time_until_next_unlock(now).num_seconds(),
            created_at: self.created_at,
            second_unlock_at: self.second_unlock_at,
            third_unlock_at: self.third_unlock_at,
            as_of: now,
        }
    }

    // =================================================================
    // Accessors
    // =================================================================

    #[must_use]
    pub fn id(&self) -> SettlementId {
        self.id
    }

    #[must_use]
    pub fn parties(&self) -> &Parties {
        &self.parties
    }

    #[must_use]
    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    #[must_use]
    pub fn amount(&self) -> Amount {
        self.amount
    }

    #[must_use]
    pub fn custody_account(&self) -> AccountId {
        self.custody_account
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn second_unlock_at(&self) -> DateTime<Utc> {
        self.second_unlock_at
    }

    #[must_use]
    pub fn third_unlock_at(&self) -> DateTime<Utc> {
        self.third_unlock_at
    }

    #[must_use]
    pub fn is_funded(&self) -> bool {
        self.funded
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.gate.is_frozen()
    }

    #[must_use]
    pub fn claim_stage(&self) -> ClaimStage {
        self.stage
    }

    #[must_use]
    pub fn claimed_first(&self) -> bool {
        self.stage.has_claimed(Tranche::First)
    }

    #[must_use]
    pub fn claimed_second(&self) -> bool {
        self.stage.has_claimed(Tranche::Second)
    }

    #[must_use]
    pub fn claimed_third(&self) -> bool {
        self.stage.has_claimed(Tranche::Third)
    }

    /// Settlement-asset units moved out by `recover_funds` so far.
    #[must_use]
    pub fn recovered(&self) -> Amount {
        self.recovered
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    // =================================================================
    // Internals
    // =================================================================

    fn authorize(&self, required: Role, caller: AccountId) -> Result<()> {
        let held = self.parties.role_of(caller);
        if held == Some(required) {
            return Ok(());
        }
        tracing::warn!(
            settlement = %self.id,
            %required,
            caller = %caller.short(),
            held = ?held,
            "Unauthorized caller rejected"
        );
        Err(EscrowError::Unauthorized { required, caller })
    }

    fn check_open(&self) -> Result<()> {
        self.gate.check_open().inspect_err(|_| {
            tracing::warn!(settlement = %self.id, "Call rejected: settlement frozen");
        })
    }
}

/// Every custody failure surfaces as `TransferFailed`.
fn transfer_failed(err: EscrowError) -> EscrowError {
    EscrowError::TransferFailed {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use escrowvest_custody::InMemoryLedger;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn days(n: i64) -> chrono::Duration {
        chrono::Duration::days(n)
    }

    /// Settlement of `amount` with the sender minted and approved.
    fn setup(amount: i64) -> (SettlementState, InMemoryLedger) {
        let cfg = SettlementConfig::dummy(Decimal::new(amount, 0));
        let state = SettlementState::new(cfg.clone(), t0()).unwrap();
        let mut ledger = InMemoryLedger::new();
        ledger
            .mint(cfg.sender, &cfg.asset, cfg.amount)
            .unwrap();
        ledger
            .approve(cfg.sender, state.custody_account(), &cfg.asset, cfg.amount)
            .unwrap();
        (state, ledger)
    }

    fn as_role(state: &SettlementState, role: Role, now: DateTime<Utc>) -> CallContext {
        CallContext::new(state.parties().account(role), now)
    }

    fn funded(amount: i64) -> (SettlementState, InMemoryLedger) {
        let (mut state, mut ledger) = setup(amount);
        let call = as_role(&state, Role::Sender, t0());
        state.fund(&mut ledger, &call).unwrap();
        (state, ledger)
    }

    #[test]
    fn unlock_times_derived_from_creation() {
        let (state, _) = setup(1000);
        assert_eq!(state.second_unlock_at(), t0() + days(90));
        assert_eq!(state.third_unlock_at(), t0() + days(180));
        assert!(state.second_unlock_at() < state.third_unlock_at());
    }

    #[test]
    fn invalid_config_rejected_at_creation() {
        let cfg = SettlementConfig::dummy(Decimal::ZERO);
        let err = SettlementState::new(cfg, t0()).unwrap_err();
        assert!(matches!(err, EscrowError::Configuration(_)));
    }

    #[test]
    fn fund_moves_amount_into_custody() {
        let (state, ledger) = funded(1000);
        assert!(state.is_funded());
        assert_eq!(
            ledger.balance_of(state.asset(), state.custody_account()),
            Decimal::new(1000, 0)
        );
        assert_eq!(
            ledger.balance_of(state.asset(), state.parties().sender),
            Decimal::ZERO
        );
        assert!(matches!(
            state.journal().events().next(),
            Some(SettlementEvent::Funded { .. })
        ));
    }

    #[test]
    fn second_fund_fails() {
        let (mut state, mut ledger) = funded(1000);
        let call = as_role(&state, Role::Sender, t0());
        let err = state.fund(&mut ledger, &call).unwrap_err();
        assert!(matches!(err, EscrowError::AlreadyFunded));
    }

    #[test]
    fn fund_without_allowance_is_transfer_failed_and_rolls_back() {
        let (mut state, mut ledger) = setup(1000);
        ledger
            .approve(
                state.parties().sender,
                state.custody_account(),
                state.asset(),
                Decimal::ZERO,
            )
            .unwrap();
        let before = state.clone();

        let call = as_role(&state, Role::Sender, t0());
        let err = state.fund(&mut ledger, &call).unwrap_err();
        assert!(
            matches!(err, EscrowError::TransferFailed { ref reason } if reason.contains("EV_ERR_403")),
            "Got: {err:?}"
        );
        assert_eq!(state, before);
    }

    #[test]
    fn withdraw_before_funding_fails() {
        let (mut state, mut ledger) = setup(1000);
        let call = as_role(&state, Role::Receiver, t0());
        let err = state.withdraw(&mut ledger, &call).unwrap_err();
        assert!(matches!(err, EscrowError::NotFunded));
    }

    #[test]
    fn unlock_instant_itself_is_not_claimable() {
        let (mut state, mut ledger) = funded(1000);
        state
            .withdraw(&mut ledger, &as_role(&state, Role::Receiver, t0()))
            .unwrap();

        let at_unlock = as_role(&state, Role::Receiver, state.second_unlock_at());
        let err = state.withdraw(&mut ledger, &at_unlock).unwrap_err();
        assert!(matches!(err, EscrowError::ClaimWindowNotOpen));

        let just_after = as_role(
            &state,
            Role::Receiver,
            state.second_unlock_at() + chrono::Duration::seconds(1),
        );
        assert_eq!(
            state.withdraw(&mut ledger, &just_after).unwrap(),
            Decimal::new(250, 0)
        );

        let at_third = as_role(&state, Role::Receiver, state.third_unlock_at());
        let err = state.withdraw(&mut ledger, &at_third).unwrap_err();
        assert!(matches!(err, EscrowError::ClaimWindowNotOpen));
        assert_eq!(state.claim_stage(), ClaimStage::Second);

        let after_third = as_role(
            &state,
            Role::Receiver,
            state.third_unlock_at() + chrono::Duration::seconds(1),
        );
        assert_eq!(
            state.withdraw(&mut ledger, &after_third).unwrap(),
            Decimal::new(250, 0)
        );
        assert_eq!(state.claim_stage(), ClaimStage::Third);
    }

    #[test]
    fn late_withdrawals_still_step_one_tranche_at_a_time() {
        let (mut state, mut ledger) = funded(1000);
        let late = t0() + days(365);
        let call = as_role(&state, Role::Receiver, late);

        assert_eq!(state.withdraw(&mut ledger, &call).unwrap(), Decimal::new(500, 0));
        assert_eq!(state.claim_stage(), ClaimStage::First);
        assert_eq!(state.withdraw(&mut ledger, &call).unwrap(), Decimal::new(250, 0));
        assert_eq!(state.claim_stage(), ClaimStage::Second);
        assert_eq!(state.withdraw(&mut ledger, &call).unwrap(), Decimal::new(250, 0));
        assert_eq!(state.claim_stage(), ClaimStage::Third);
        assert!(matches!(
            state.withdraw(&mut ledger, &call),
            Err(EscrowError::FullyClaimed)
        ));
    }

    #[test]
    fn freeze_and_unfreeze_always_emit() {
        let (mut state, _) = setup(1000);
        let call = as_role(&state, Role::Arbiter, t0());
        state.freeze(&call).unwrap();
        state.freeze(&call).unwrap();
        state.unfreeze(&call).unwrap();
        state.unfreeze(&call).unwrap();
        assert!(!state.is_frozen());
        assert_eq!(state.journal().len(), 4);
    }

    #[test]
    fn frozen_blocks_withdraw_even_when_eligible() {
        let (mut state, mut ledger) = funded(1000);
        state
            .freeze(&as_role(&state, Role::Arbiter, t0()))
            .unwrap();
        let err = state
            .withdraw(&mut ledger, &as_role(&state, Role::Receiver, t0()))
            .unwrap_err();
        assert!(matches!(err, EscrowError::Frozen));
    }

    #[test]
    fn frozen_check_precedes_funding_checks() {
        let (mut state, mut ledger) = funded(1000);
        state
            .freeze(&as_role(&state, Role::Arbiter, t0()))
            .unwrap();
        // Already funded, but Frozen wins.
        let err = state
            .fund(&mut ledger, &as_role(&state, Role::Sender, t0()))
            .unwrap_err();
        assert!(matches!(err, EscrowError::Frozen));
    }

    #[test]
    fn authorization_precedes_freeze() {
        let (mut state, mut ledger) = setup(1000);
        state
            .freeze(&as_role(&state, Role::Arbiter, t0()))
            .unwrap();
        let err = state
            .fund(&mut ledger, &as_role(&state, Role::Arbiter, t0()))
            .unwrap_err();
        assert!(matches!(
            err,
            EscrowError::Unauthorized {
                required: Role::Sender,
                ..
            }
        ));
    }

    #[test]
    fn recover_funds_when_unfunded_moves_nothing() {
        let (mut state, mut ledger) = setup(1000);
        let moved = state
            .recover_funds(&mut ledger, &as_role(&state, Role::Arbiter, t0()))
            .unwrap();
        assert_eq!(moved, Decimal::ZERO);
        assert!(!state.is_funded());
        assert!(state.check_conservation(&ledger).is_ok());
    }

    #[test]
    fn recover_funds_ignores_freeze() {
        let (mut state, mut ledger) = funded(1000);
        let arbiter = as_role(&state, Role::Arbiter, t0());
        state.freeze(&arbiter).unwrap();
        let moved = state.recover_funds(&mut ledger, &arbiter).unwrap();
        assert_eq!(moved, Decimal::new(1000, 0));
        assert_eq!(
            ledger.balance_of(state.asset(), state.parties().arbiter),
            Decimal::new(1000, 0)
        );
    }

    #[test]
    fn recover_funds_after_first_claim_takes_remainder() {
        let (mut state, mut ledger) = funded(1000);
        state
            .withdraw(&mut ledger, &as_role(&state, Role::Receiver, t0()))
            .unwrap();
        let moved = state
            .recover_funds(&mut ledger, &as_role(&state, Role::Arbiter, t0()))
            .unwrap();
        assert_eq!(moved, Decimal::new(500, 0));
        assert_eq!(state.recovered(), Decimal::new(500, 0));
        assert!(state.check_conservation(&ledger).is_ok());
    }

    #[test]
    fn recover_funds_emits_no_event() {
        let (mut state, mut ledger) = funded(1000);
        let before = state.journal().len();
        state
            .recover_funds(&mut ledger, &as_role(&state, Role::Arbiter, t0()))
            .unwrap();
        assert_eq!(state.journal().len(), before);
    }

    #[test]
    fn foreign_asset_recovery() {
        let (mut state, mut ledger) = funded(1000);
        let dai = AssetId::new("DAI");
        ledger
            .mint(state.custody_account(), &dai, Decimal::new(42, 0))
            .unwrap();

        let arbiter = as_role(&state, Role::Arbiter, t0());
        state
            .recover_foreign_asset(&mut ledger, &arbiter, &dai, Decimal::new(42, 0))
            .unwrap();
        assert_eq!(
            ledger.balance_of(&dai, state.parties().arbiter),
            Decimal::new(42, 0)
        );
        assert_eq!(ledger.balance_of(&dai, state.custody_account()), Decimal::ZERO);
        assert!(state.check_conservation(&ledger).is_ok());
    }

    #[test]
    fn foreign_recovery_rejects_settlement_asset() {
        let (mut state, mut ledger) = funded(1000);
        let asset = state.asset().clone();
        let arbiter = as_role(&state, Role::Arbiter, t0());
        let err = state
            .recover_foreign_asset(&mut ledger, &arbiter, &asset, Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidAsset(ref a) if *a == asset));
        assert_eq!(
            ledger.balance_of(&asset, state.custody_account()),
            Decimal::new(1000, 0)
        );
    }

    #[test]
    fn foreign_recovery_overdraw_is_transfer_failed() {
        let (mut state, mut ledger) = funded(1000);
        let arbiter = as_role(&state, Role::Arbiter, t0());
        let err = state
            .recover_foreign_asset(&mut ledger, &arbiter, &AssetId::new("DAI"), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, EscrowError::TransferFailed { .. }));
    }

    #[test]
    fn time_until_next_unlock_steps_through_windows() {
        let (state, _) = setup(1000);
        assert_eq!(state.time_until_next_unlock(t0()), days(90));
        assert_eq!(state.time_until_next_unlock(t0() + days(30)), days(60));
        // At the second unlock instant the countdown switches to the third.
        assert_eq!(state.time_until_next_unlock(t0() + days(90)), days(90));
        assert_eq!(state.time_until_next_unlock(t0() + days(179)), days(1));
        assert_eq!(
            state.time_until_next_unlock(t0() + days(180)),
            chrono::Duration::zero()
        );
        assert_eq!(
            state.time_until_next_unlock(t0() + days(1000)),
            chrono::Duration::zero()
        );
    }

    #[test]
    fn amount_next_unlock_literal_logic() {
        let (mut state, mut ledger) = funded(1000);
        assert_eq!(state.amount_next_unlock(t0()), Decimal::new(500, 0));

        state
            .withdraw(&mut ledger, &as_role(&state, Role::Receiver, t0()))
            .unwrap();
        assert_eq!(state.amount_next_unlock(t0()), Decimal::new(250, 0));

        // Second tranche claimed, yet the projection still reports 25%
        // until the third unlock instant.
        let after_second = t0() + days(91);
        state
            .withdraw(&mut ledger, &as_role(&state, Role::Receiver, after_second))
            .unwrap();
        assert!(state.claimed_second());
        assert_eq!(state.amount_next_unlock(after_second), Decimal::new(250, 0));

        assert_eq!(state.amount_next_unlock(t0() + days(180)), Decimal::ZERO);
    }

    #[test]
    fn total_claimed_tracks_stage() {
        let (mut state, mut ledger) = funded(1000);
        assert_eq!(state.total_claimed(), Decimal::ZERO);
        state
            .withdraw(&mut ledger, &as_role(&state, Role::Receiver, t0()))
            .unwrap();
        assert_eq!(state.total_claimed(), Decimal::new(500, 0));
        assert!(state.check_conservation(&ledger).is_ok());
    }

    #[test]
    fn stray_deposit_breaks_conservation() {
        let (state, mut ledger) = funded(1000);
        ledger
            .mint(state.custody_account(), state.asset(), Decimal::ONE)
            .unwrap();
        let err = state.check_conservation(&ledger).unwrap_err();
        assert!(matches!(err, EscrowError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn snapshot_reflects_state() {
        let (mut state, mut ledger) = funded(1000);
        state
            .withdraw(&mut ledger, &as_role(&state, Role::Receiver, t0()))
            .unwrap();
        let now = t0() + days(10);
        let status = state.snapshot(now);
        assert!(status.funded);
        assert!(!status.frozen);
        assert_eq!(status.claim_stage, ClaimStage::First);
        assert_eq!(status.total_claimed, Decimal::new(500, 0));
        assert_eq!(status.amount_next_unlock, Decimal::new(250, 0));
        assert_eq!(status.seconds_until_next_unlock, days(80).num_seconds());
        assert_eq!(status.as_of, now);
    }
}
