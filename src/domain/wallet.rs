use super::ledger::{EntryKind, LedgerEntry};
use super::money::{Amount, Balance};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type InstructorId = u64;

/// An instructor's money state.
///
/// Balances are private: the only way to change them is through `credit`,
/// `debit`, `reserve` and `release`, each of which re-checks
/// `0 <= pending <= available` and leaves the wallet untouched when the check
/// fails. The primitives are crate-private so only the commission engine and
/// the payout workflow can call them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    instructor: InstructorId,
    available: Balance,
    pending: Balance,
    total_earned: Balance,
    /// Sequence number of the last ledger entry written for this wallet.
    last_seq: u64,
    updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(instructor: InstructorId) -> Self {
        Self {
            instructor,
            available: Balance::ZERO,
            pending: Balance::ZERO,
            total_earned: Balance::ZERO,
            last_seq: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn instructor(&self) -> InstructorId {
        self.instructor
    }

    pub fn available(&self) -> Balance {
        self.available
    }

    pub fn pending(&self) -> Balance {
        self.pending
    }

    pub fn total_earned(&self) -> Balance {
        self.total_earned
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Funds eligible for a new payout request.
    pub fn withdrawable(&self) -> Balance {
        self.available - self.pending
    }

    /// Adds earned funds and records a CREDIT entry.
    pub(crate) fn credit(&mut self, amount: Amount, reference: String) -> Result<LedgerEntry> {
        let amount_b = Balance::from(amount);
        self.apply(|w| {
            w.available = w.available.checked_add(amount_b)?;
            w.total_earned = w.total_earned.checked_add(amount_b)?;
            Ok(())
        })?;
        Ok(self.append(EntryKind::Credit, amount, reference))
    }

    /// Settles reserved funds: removes `amount` from both available and pending
    /// and records a DEBIT entry.
    pub(crate) fn debit(&mut self, amount: Amount, reference: String) -> Result<LedgerEntry> {
        let amount_b = Balance::from(amount);
        self.apply(|w| {
            w.available = w.available.checked_sub(amount_b)?;
            w.pending = w.pending.checked_sub(amount_b)?;
            Ok(())
        })?;
        Ok(self.append(EntryKind::Debit, amount, reference))
    }

    /// Holds funds against a future payout. No money moves, so no entry.
    pub(crate) fn reserve(&mut self, amount: Amount) -> Result<()> {
        self.apply(|w| {
            w.pending = w.pending.checked_add(Balance::from(amount))?;
            Ok(())
        })
    }

    /// Returns held funds to the withdrawable pool.
    pub(crate) fn release(&mut self, amount: Amount) -> Result<()> {
        self.apply(|w| {
            w.pending = w.pending.checked_sub(Balance::from(amount))?;
            Ok(())
        })
    }

    pub fn check_invariant(&self) -> Result<()> {
        if self.pending.is_negative() {
            return Err(LedgerError::ConsistencyViolation(format!(
                "wallet {}: pending balance {} is negative",
                self.instructor, self.pending
            )));
        }
        if self.pending > self.available {
            return Err(LedgerError::ConsistencyViolation(format!(
                "wallet {}: pending balance {} exceeds available balance {}",
                self.instructor, self.pending, self.available
            )));
        }
        Ok(())
    }

    // Mutates a copy so a failed check never leaves a half-applied wallet.
    fn apply(&mut self, mutate: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let mut next = self.clone();
        mutate(&mut next)?;
        next.check_invariant()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    fn append(&mut self, kind: EntryKind, amount: Amount, reference: String) -> LedgerEntry {
        self.last_seq += 1;
        LedgerEntry {
            instructor: self.instructor,
            seq: self.last_seq,
            kind,
            amount,
            reference,
            created_at: self.updated_at,
        }
    }
}
