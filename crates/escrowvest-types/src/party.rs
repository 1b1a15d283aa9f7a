//! The three parties of a settlement and their roles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Which party an operation is reserved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Funds the escrow. Only caller allowed to `fund`.
    Sender,
    /// Vests the escrowed amount. Only caller allowed to `withdraw`.
    Receiver,
    /// Dispute resolver: freeze, unfreeze and recovery powers.
    Arbiter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => write!(f, "SENDER"),
            Self::Receiver => write!(f, "RECEIVER"),
            Self::Arbiter => write!(f, "ARBITER"),
        }
    }
}

/// The fixed triple of parties bound to a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parties {
    pub sender: AccountId,
    pub receiver: AccountId,
    pub arbiter: AccountId,
}

impl Parties {
    /// Account holding the given role.
    #[must_use]
    pub fn account(&self, role: Role) -> AccountId {
        match role {
            Role::Sender => self.sender,
            Role::Receiver => self.receiver,
            Role::Arbiter => self.arbiter,
        }
    }

    /// Role held by `account`, if any.
    #[must_use]
    pub fn role_of(&self, account: AccountId) -> Option<Role> {
        [Role::Sender, Role::Receiver, Role::Arbiter]
            .into_iter()
            .find(|role| self.account(*role) == account)
    }

    /// `true` when no account holds two roles.
    #[must_use]
    pub fn are_distinct(&self) -> bool {
        self.sender != self.receiver && self.sender != self.arbiter && self.receiver != self.arbiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties() -> Parties {
        Parties {
            sender: AccountId::new(),
            receiver: AccountId::new(),
            arbiter: AccountId::new(),
        }
    }

    #[test]
    fn role_lookup_roundtrip() {
        let p = parties();
        for role in [Role::Sender, Role::Receiver, Role::Arbiter] {
            assert_eq!(p.role_of(p.account(role)), Some(role));
        }
        assert_eq!(p.role_of(AccountId::new()), None);
    }

    #[test]
    fn duplicate_party_detected() {
        let mut p = parties();
        assert!(p.are_distinct());
        p.arbiter = p.sender;
        assert!(!p.are_distinct());
    }

    #[test]
    fn role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Arbiter).unwrap();
        assert_eq!(json, "\"arbiter\"");
    }
}
