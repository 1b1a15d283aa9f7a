//! Events emitted on successful settlement mutations.
//!
//! Off-chain indexers and UIs rebuild the audit trail from these. Recovery
//! operations do not emit an event.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Amount;

/// A settlement state change that committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SettlementEvent {
    /// The sender moved the full settlement amount into custody.
    Funded {
        amount: Amount,
        timestamp: DateTime<Utc>,
    },
    /// The receiver claimed a tranche.
    Withdrawal {
        amount: Amount,
        timestamp: DateTime<Utc>,
    },
    /// The arbiter froze the settlement.
    Frozen { timestamp: DateTime<Utc> },
    /// The arbiter lifted a freeze.
    Unfrozen { timestamp: DateTime<Utc> },
}

impl SettlementEvent {
    /// When the event was emitted.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Funded { timestamp, .. }
            | Self::Withdrawal { timestamp, .. }
            | Self::Frozen { timestamp }
            | Self::Unfrozen { timestamp } => *timestamp,
        }
    }

    /// Amount moved, for the events that move funds.
    #[must_use]
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Self::Funded { amount, .. } | Self::Withdrawal { amount, .. } => Some(*amount),
            Self::Frozen { .. } | Self::Unfrozen { .. } => None,
        }
    }
}

impl fmt::Display for SettlementEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Funded { .. } => write!(f, "FUNDED"),
            Self::Withdrawal { .. } => write!(f, "WITHDRAWAL"),
            Self::Frozen { .. } => write!(f, "FROZEN"),
            Self::Unfrozen { .. } => write!(f, "UNFROZEN"),
        }
    }
}
