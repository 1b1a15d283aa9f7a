//! Hash-chained event journal.
//!
//! Every committed [`SettlementEvent`] is appended with a sequence number
//! and a SHA-256 link to the previous entry:
//!
//! ```text
//! hash[n] = SHA256("escrowvest:journal:v1:" || hash[n-1] || n || kind || amount || timestamp)
//! ```
//!
//! Indexers that replay the journal can detect any dropped, reordered or
//! edited entry by recomputing the chain.

use escrowvest_types::{EscrowError, Result, SettlementEvent, constants};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One appended event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub event: SettlementEvent,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

/// Append-only journal of settlement events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an event, linking it to the current head.
    pub fn append(&mut self, event: SettlementEvent) -> &JournalEntry {
        let sequence = self.entries.len() as u64;
        let prev_hash = self.head();
        let hash = entry_hash(&prev_hash, sequence, &event);
        self.entries.push(JournalEntry {
            sequence,
            event,
            prev_hash,
            hash,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Hash of the latest entry, or all zeroes when empty.
    #[must_use]
    pub fn head(&self) -> [u8; 32] {
        self.entries.last().map_or([0u8; 32], |e| e.hash)
    }

    #[must_use]
    pub fn head_hex(&self) -> String {
        hex::encode(self.head())
    }

    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Events in emission order.
    pub fn events(&self) -> impl Iterator<Item = &SettlementEvent> {
        self.entries.iter().map(|e| &e.event)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute the chain over `entries`.
    ///
    /// # Errors
    /// Returns [`EscrowError::JournalChainBroken`] at the first entry whose
    /// sequence, back-link or hash does not match.
    pub fn verify_chain(entries: &[JournalEntry]) -> Result<()> {
        let mut prev = [0u8; 32];
        for (idx, entry) in entries.iter().enumerate() {
            let expected_seq = idx as u64;
            if entry.sequence != expected_seq
                || entry.prev_hash != prev
                || entry.hash != entry_hash(&prev, expected_seq, &entry.event)
            {
                return Err(EscrowError::JournalChainBroken {
                    sequence: expected_seq,
                });
            }
            prev = entry.hash;
        }
        Ok(())
    }
}

fn entry_hash(prev: &[u8; 32], sequence: u64, event: &SettlementEvent) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::JOURNAL_DOMAIN);
    hasher.update(prev);
    hasher.update(sequence.to_le_bytes());
    hasher.update(event.to_string().as_bytes());
    if let Some(amount) = event.amount() {
        hasher.update(amount.to_string().as_bytes());
    }
    hasher.update(event.timestamp().to_rfc3339().as_bytes());

    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}
