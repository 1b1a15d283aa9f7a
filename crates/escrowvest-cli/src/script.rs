//! Scripted settlement simulation.
//!
//! A script is a JSON list of steps, each run against a fresh in-memory
//! ledger at `creation + at_days + plus_seconds`:
//!
//! ```json
//! { "steps": [
//!     { "at_days": 0,  "caller": "sender",   "op": "fund" },
//!     { "at_days": 0,  "caller": "receiver", "op": "withdraw" },
//!     { "at_days": 91, "caller": "receiver", "op": "withdraw" }
//! ] }
//! ```
//!
//! Failed steps are recorded, not fatal: the point is to observe how the
//! settlement answers each call.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use escrowvest_core::{CallContext, SettlementState};
use escrowvest_custody::{AssetCustody, InMemoryLedger};
use escrowvest_types::{AccountId, Amount, AssetId, Role, SettlementConfig, SettlementStatus};
use serde::{Deserialize, Serialize};

/// Who issues a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Caller {
    Sender,
    Receiver,
    Arbiter,
    /// An account outside the settlement.
    Stranger,
}

/// The call a step makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepOp {
    Fund,
    Withdraw,
    Freeze,
    Unfreeze,
    RecoverFunds,
    RecoverForeignAsset { asset: AssetId, amount: Amount },
    /// The caller mistakenly sends `amount` of `asset` to the custody account.
    StrayTransfer { asset: AssetId, amount: Amount },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub at_days: i64,
    #[serde(default)]
    pub plus_seconds: i64,
    pub caller: Caller,
    #[serde(flatten)]
    pub op: StepOp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse simulation script")
    }
}

/// What happened when a step ran.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub at: DateTime<Utc>,
    pub caller: Caller,
    #[serde(flatten)]
    pub op: StepOp,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A settlement plus the ledger it moves funds through.
pub struct Simulation {
    state: SettlementState,
    ledger: InMemoryLedger,
    stranger: AccountId,
    last_at: DateTime<Utc>,
}

impl Simulation {
    /// Create the settlement at `start`. The sender is minted the settlement
    /// amount and approves the custody account for it.
    pub fn new(config: SettlementConfig, start: DateTime<Utc>) -> Result<Self> {
        let state = SettlementState::new(config.clone(), start)?;
        let mut ledger = InMemoryLedger::new();
        ledger.mint(config.sender, &config.asset, config.amount)?;
        ledger.approve(
            config.sender,
            state.custody_account(),
            &config.asset,
            config.amount,
        )?;
        Ok(Self {
            state,
            ledger,
            stranger: AccountId::new(),
            last_at: start,
        })
    }

    /// Run every step in order.
    ///
    /// # Errors
    /// Fails if a step is scheduled before the previous one.
    pub fn run(&mut self, script: &Script) -> Result<Vec<StepOutcome>> {
        script
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect()
    }

    fn run_step(&mut self, index: usize, step: &Step) -> Result<StepOutcome> {
        let at = Duration::try_days(step.at_days)
            .zip(Duration::try_seconds(step.plus_seconds))
            .and_then(|(days, secs)| days.checked_add(&secs))
            .and_then(|offset| self.state.created_at().checked_add_signed(offset))
            .with_context(|| {
                format!(
                    "step {index} offset of {} days + {} s is out of range",
                    step.at_days, step.plus_seconds
                )
            })?;
        if at < self.last_at {
            bail!("step {index} at {at} is earlier than the previous step at {}", self.last_at);
        }
        self.last_at = at;

        let caller = self.account(step.caller);
        let call = CallContext::new(caller, at);
        let result = match &step.op {
            StepOp::Fund => self.state.fund(&mut self.ledger, &call).map(|()| None),
            StepOp::Withdraw => self.state.withdraw(&mut self.ledger, &call).map(Some),
            StepOp::Freeze => self.state.freeze(&call).map(|()| None),
            StepOp::Unfreeze => self.state.unfreeze(&call).map(|()| None),
            StepOp::RecoverFunds => self.state.recover_funds(&mut self.ledger, &call).map(Some),
            StepOp::RecoverForeignAsset { asset, amount } => self
                .state
                .recover_foreign_asset(&mut self.ledger, &call, asset, *amount)
                .map(|()| Some(*amount)),
            StepOp::StrayTransfer { asset, amount } => self
                .ledger
                .mint(caller, asset, *amount)
                .and_then(|()| {
                    self.ledger
                        .transfer(asset, caller, self.state.custody_account(), *amount)
                })
                .map(|()| Some(*amount)),
        };

        let outcome = match result {
            Ok(amount) => StepOutcome {
                index,
                at,
                caller: step.caller,
                op: step.op.clone(),
                ok: true,
                amount,
                error: None,
            },
            Err(err) => {
                tracing::debug!(index, error = %err, "Step rejected");
                StepOutcome {
                    index,
                    at,
                    caller: step.caller,
                    op: step.op.clone(),
                    ok: false,
                    amount: None,
                    error: Some(err.to_string()),
                }
            }
        };
        Ok(outcome)
    }

    fn account(&self, caller: Caller) -> AccountId {
        let parties = self.state.parties();
        match caller {
            Caller::Sender => parties.account(Role::Sender),
            Caller::Receiver => parties.account(Role::Receiver),
            Caller::Arbiter => parties.account(Role::Arbiter),
            Caller::Stranger => self.stranger,
        }
    }

    /// Settlement status at the time of the last step.
    pub fn status(&self) -> SettlementStatus {
        self.state.snapshot(self.last_at)
    }

    pub fn state(&self) -> &SettlementState {
        &self.state
    }

    /// Custody balance against settlement bookkeeping, plus ledger supply.
    pub fn check_conservation(&self) -> escrowvest_types::Result<()> {
        self.state.check_conservation(&self.ledger)?;
        self.ledger.verify_all_supplies()
    }

    /// Balance of the settlement asset held by `caller`.
    pub fn balance(&self, caller: Caller) -> Amount {
        self.ledger
            .balance_of(self.state.asset(), self.account(caller))
    }
}
