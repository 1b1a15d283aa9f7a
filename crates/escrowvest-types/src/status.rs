//! Serializable point-in-time view of a settlement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, AssetId, ClaimStage, Parties, SettlementId};

/// Everything a UI or indexer needs to render a settlement at `as_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStatus {
    pub settlement_id: SettlementId,
    pub parties: Parties,
    pub asset: AssetId,
    pub amount: Amount,
    pub funded: bool,
    pub frozen: bool,
    pub claim_stage: ClaimStage,
    pub total_claimed: Amount,
    pub amount_next_unlock: Amount,
    /// Whole seconds until the next unlock; zero once both have passed.
    pub seconds_until_next_unlock: i64,
    pub created_at: DateTime<Utc>,
    pub second_unlock_at: DateTime<Utc>,
    pub third_unlock_at: DateTime<Utc>,
    pub as_of: DateTime<Utc>,
}
