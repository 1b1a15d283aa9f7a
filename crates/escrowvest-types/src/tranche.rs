//! # Tranches and claim progression
//!
//! A settlement vests in three fixed tranches: 50% immediately after
//! funding, 25% after the second unlock, 25% after the third.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐ withdraw ┌───────┐ withdraw ┌────────┐ withdraw ┌───────┐
//!   │ NONE ├─────────▶│ FIRST ├─────────▶│ SECOND ├─────────▶│ THIRD │
//!   └──────┘          └───────┘  (> t2)  └────────┘  (> t3)  └───────┘
//! ```
//!
//! Transitions only move forward, one step per withdrawal, so a later
//! tranche can never be marked claimed before an earlier one.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Quantity of an asset in smallest units (whole numbers only).
pub type Amount = Decimal;

/// One of the three fixed-percentage portions of the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tranche {
    First,
    Second,
    Third,
}

impl Tranche {
    /// Percentage of the settlement amount paid by this tranche.
    #[must_use]
    pub fn percent(self) -> u32 {
        match self {
            Self::First => constants::FIRST_TRANCHE_PCT,
            Self::Second => constants::SECOND_TRANCHE_PCT,
            Self::Third => constants::THIRD_TRANCHE_PCT,
        }
    }

    /// Payout for this tranche: `total * pct / 100`, truncated.
    ///
    /// Each tranche truncates on its own, so an amount not divisible by 4
    /// pays out 1 to 3 units less than `total` across all three.
    #[must_use]
    pub fn amount_of(self, total: Amount) -> Amount {
        (total * Decimal::from(self.percent()) / Decimal::ONE_HUNDRED).trunc()
    }
}

impl fmt::Display for Tranche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "FIRST"),
            Self::Second => write!(f, "SECOND"),
            Self::Third => write!(f, "THIRD"),
        }
    }
}

/// How far the receiver has progressed through the tranches.
///
/// Names the last tranche claimed; `None` means nothing claimed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStage {
    #[default]
    None,
    First,
    Second,
    Third,
}

impl ClaimStage {
    /// The tranche a withdrawal would claim next, or `None` when fully claimed.
    #[must_use]
    pub fn pending_tranche(self) -> Option<Tranche> {
        match self {
            Self::None => Some(Tranche::First),
            Self::First => Some(Tranche::Second),
            Self::Second => Some(Tranche::Third),
            Self::Third => None,
        }
    }

    /// Stage reached after claiming `tranche`.
    #[must_use]
    pub fn after(tranche: Tranche) -> Self {
        match tranche {
            Tranche::First => Self::First,
            Tranche::Second => Self::Second,
            Tranche::Third => Self::Third,
        }
    }

    /// Can this stage move directly to `target`? Only single forward steps.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.pending_tranche().map(Self::after) == Some(target)
    }

    /// Whether `tranche` has already been claimed.
    #[must_use]
    pub fn has_claimed(self, tranche: Tranche) -> bool {
        self >= Self::after(tranche)
    }

    #[must_use]
    pub fn is_fully_claimed(self) -> bool {
        self == Self::Third
    }

    /// Tranches claimed so far, in order.
    pub fn claimed_tranches(self) -> impl Iterator<Item = Tranche> {
        [Tranche::First, Tranche::Second, Tranche::Third]
            .into_iter()
            .filter(move |t| self.has_claimed(*t))
    }
}

impl fmt::Display for ClaimStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::First => write!(f, "FIRST"),
            Self::Second => write!(f, "SECOND"),
            Self::Third => write!(f, "THIRD"),
        }
    }
}
