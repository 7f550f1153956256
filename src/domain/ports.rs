use super::ledger::LedgerEntry;
use super::payment_account::PaymentAccount;
use super::payout::{PayoutId, PayoutRequest};
use super::revenue::RevenueRecord;
use super::wallet::{InstructorId, Wallet};
use crate::error::Result;
use async_trait::async_trait;

/// Everything one unit of work writes. A store commits all of it or none of it.
#[derive(Debug, Default, Clone)]
pub struct ChangeSet {
    pub wallets: Vec<Wallet>,
    pub entries: Vec<LedgerEntry>,
    pub revenue: Vec<RevenueRecord>,
    pub payouts: Vec<PayoutRequest>,
    pub accounts: Vec<PaymentAccount>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
            && self.entries.is_empty()
            && self.revenue.is_empty()
            && self.payouts.is_empty()
            && self.accounts.is_empty()
    }
}

/// Revenue and payouts read at one instant, for reports that join the two.
#[derive(Debug, Default, Clone)]
pub struct LedgerSnapshot {
    pub revenue: Vec<RevenueRecord>,
    pub payouts: Vec<PayoutRequest>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn wallet(&self, instructor: InstructorId) -> Result<Option<Wallet>>;
    async fn wallets(&self) -> Result<Vec<Wallet>>;
    /// Entries of one wallet, oldest first.
    async fn ledger_entries(&self, instructor: InstructorId) -> Result<Vec<LedgerEntry>>;
    async fn revenue_record(&self, order_id: &str) -> Result<Option<RevenueRecord>>;
    async fn payout(&self, id: PayoutId) -> Result<Option<PayoutRequest>>;
    async fn payouts(&self) -> Result<Vec<PayoutRequest>>;
    async fn payment_account(&self, instructor: InstructorId) -> Result<Option<PaymentAccount>>;
    async fn next_payout_id(&self) -> Result<PayoutId>;
    async fn snapshot(&self) -> Result<LedgerSnapshot>;
    /// Applies a change set atomically. Rejects a ledger entry or revenue record
    /// whose key already exists with `ConsistencyViolation`.
    async fn commit(&self, changes: ChangeSet) -> Result<()>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
