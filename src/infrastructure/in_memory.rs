use crate::domain::ledger::LedgerEntry;
use crate::domain::payment_account::PaymentAccount;
use crate::domain::payout::{PayoutId, PayoutRequest};
use crate::domain::ports::{ChangeSet, LedgerSnapshot, LedgerStore};
use crate::domain::revenue::RevenueRecord;
use crate::domain::wallet::{InstructorId, Wallet};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    wallets: BTreeMap<InstructorId, Wallet>,
    entries: HashMap<InstructorId, Vec<LedgerEntry>>,
    revenue: HashMap<String, RevenueRecord>,
    payouts: BTreeMap<PayoutId, PayoutRequest>,
    accounts: HashMap<InstructorId, PaymentAccount>,
}

impl State {
    fn last_seq(&self, instructor: InstructorId) -> u64 {
        self.entries
            .get(&instructor)
            .and_then(|entries| entries.last())
            .map_or(0, |entry| entry.seq)
    }

    fn check_append_only(&self, changes: &ChangeSet) -> Result<()> {
        let mut last_seen: HashMap<InstructorId, u64> = HashMap::new();
        for entry in &changes.entries {
            let last = last_seen
                .entry(entry.instructor)
                .or_insert_with(|| self.last_seq(entry.instructor));
            if entry.seq <= *last {
                return Err(LedgerError::ConsistencyViolation(format!(
                    "ledger entry {} of wallet {} already written",
                    entry.seq, entry.instructor
                )));
            }
            *last = entry.seq;
        }

        let mut orders = HashSet::new();
        for record in &changes.revenue {
            if self.revenue.contains_key(&record.order_id) || !orders.insert(&record.order_id) {
                return Err(LedgerError::ConsistencyViolation(format!(
                    "revenue for order {} already recorded",
                    record.order_id
                )));
            }
        }
        Ok(())
    }
}

/// A thread-safe in-memory ledger store.
///
/// All tables live behind one `RwLock`, so a commit is applied in a single
/// critical section and every read observes either all or none of it.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<State>>,
    payout_seq: Arc<AtomicU64>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn wallet(&self, instructor: InstructorId) -> Result<Option<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.get(&instructor).cloned())
    }

    async fn wallets(&self) -> Result<Vec<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.values().cloned().collect())
    }

    async fn ledger_entries(&self, instructor: InstructorId) -> Result<Vec<LedgerEntry>> {
        let state = self.state.read().await;
        Ok(state.entries.get(&instructor).cloned().unwrap_or_default())
    }

    async fn revenue_record(&self, order_id: &str) -> Result<Option<RevenueRecord>> {
        let state = self.state.read().await;
        Ok(state.revenue.get(order_id).cloned())
    }

    async fn payout(&self, id: PayoutId) -> Result<Option<PayoutRequest>> {
        let state = self.state.read().await;
        Ok(state.payouts.get(&id).cloned())
    }

    async fn payouts(&self) -> Result<Vec<PayoutRequest>> {
        let state = self.state.read().await;
        Ok(state.payouts.values().cloned().collect())
    }

    async fn payment_account(&self, instructor: InstructorId) -> Result<Option<PaymentAccount>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&instructor).cloned())
    }

    async fn next_payout_id(&self) -> Result<PayoutId> {
        Ok(self.payout_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot> {
        let state = self.state.read().await;
        Ok(LedgerSnapshot {
            revenue: state.revenue.values().cloned().collect(),
            payouts: state.payouts.values().cloned().collect(),
        })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_append_only(&changes)?;

        for wallet in changes.wallets {
            state.wallets.insert(wallet.instructor(), wallet);
        }
        for entry in changes.entries {
            state.entries.entry(entry.instructor).or_default().push(entry);
        }
        for record in changes.revenue {
            state.revenue.insert(record.order_id.clone(), record);
        }
        for payout in changes.payouts {
            state.payouts.insert(payout.id, payout);
        }
        for account in changes.accounts {
            state.accounts.insert(account.instructor, account);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Balance};
    use rust_decimal_macros::dec;

    fn credited_wallet(instructor: InstructorId) -> (Wallet, LedgerEntry) {
        let mut wallet = Wallet::new(instructor);
        let entry = wallet
            .credit(Amount::new(dec!(100)).unwrap(), "ORDER-1".into())
            .unwrap();
        (wallet, entry)
    }

    #[tokio::test]
    async fn test_commit_and_read_back() {
        let store = InMemoryLedgerStore::new();
        let (wallet, entry) = credited_wallet(1);

        store
            .commit(ChangeSet {
                wallets: vec![wallet.clone()],
                entries: vec![entry.clone()],
                ..ChangeSet::new()
            })
            .await
            .unwrap();

        let retrieved = store.wallet(1).await.unwrap().unwrap();
        assert_eq!(retrieved.available(), Balance::new(dec!(100)));
        assert_eq!(store.ledger_entries(1).await.unwrap(), vec![entry]);
        assert!(store.wallet(2).await.unwrap().is_none());
        assert!(store.ledger_entries(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rewriting_an_entry_is_rejected_atomically() {
        let store = InMemoryLedgerStore::new();
        let (wallet, entry) = credited_wallet(1);
        store
            .commit(ChangeSet {
                wallets: vec![wallet.clone()],
                entries: vec![entry.clone()],
                ..ChangeSet::new()
            })
            .await
            .unwrap();

        let mut replay = wallet.clone();
        replay
            .reserve(Amount::new(dec!(10)).unwrap())
            .unwrap();
        let result = store
            .commit(ChangeSet {
                wallets: vec![replay],
                entries: vec![entry],
                ..ChangeSet::new()
            })
            .await;

        assert!(matches!(result, Err(LedgerError::ConsistencyViolation(_))));
        // The wallet row from the failed commit must not be visible.
        assert_eq!(store.wallet(1).await.unwrap().unwrap(), wallet);
    }

    #[tokio::test]
    async fn test_payout_ids_are_unique() {
        let store = InMemoryLedgerStore::new();
        let a = store.next_payout_id().await.unwrap();
        let b = store.next_payout_id().await.unwrap();
        assert_eq!((a, b), (1, 2));
    }
}
