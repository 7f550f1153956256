use super::money::Amount;
use super::wallet::InstructorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Credit,
    Debit,
}

/// One immutable money movement on a wallet.
///
/// Entries are only produced by `Wallet::credit` and `Wallet::debit`, which also
/// assign `seq`. The pair `(instructor, seq)` identifies an entry and is never
/// reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub instructor: InstructorId,
    pub seq: u64,
    pub kind: EntryKind,
    pub amount: Amount,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

pub fn order_reference(order_id: &str) -> String {
    format!("ORDER-{order_id}")
}

pub fn payout_reference(payout_id: u64) -> String {
    format!("PAYOUT-{payout_id}")
}
