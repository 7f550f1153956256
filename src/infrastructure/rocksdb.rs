use crate::domain::ledger::LedgerEntry;
use crate::domain::payment_account::PaymentAccount;
use crate::domain::payout::{PayoutId, PayoutRequest};
use crate::domain::ports::{ChangeSet, LedgerSnapshot, LedgerStore};
use crate::domain::revenue::RevenueRecord;
use crate::domain::wallet::{InstructorId, Wallet};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for wallet rows, keyed by instructor id.
pub const CF_WALLETS: &str = "wallets";
/// Column Family for ledger entries, keyed by instructor id then sequence.
pub const CF_LEDGER: &str = "ledger";
/// Column Family for revenue records, keyed by order id.
pub const CF_REVENUE: &str = "revenue";
/// Column Family for payout requests, keyed by payout id.
pub const CF_PAYOUTS: &str = "payouts";
/// Column Family for payment accounts, keyed by instructor id.
pub const CF_ACCOUNTS: &str = "payment_accounts";

const COLUMN_FAMILIES: [&str; 5] = [CF_WALLETS, CF_LEDGER, CF_REVENUE, CF_PAYOUTS, CF_ACCOUNTS];

fn ledger_key(instructor: InstructorId, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&instructor.to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// A persistent store implementation using RocksDB.
///
/// Each entity type lives in its own Column Family. A `ChangeSet` is written as
/// one `rocksdb::WriteBatch`, which RocksDB applies atomically.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    payout_seq: Arc<AtomicU64>,
    // Serializes the duplicate check with the batch write.
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist and resumes payout id
    /// allocation after the highest stored id.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        let store = Self {
            db: Arc::new(db),
            payout_seq: Arc::new(AtomicU64::new(0)),
            commit_lock: Arc::new(Mutex::new(())),
        };
        let last_id = store.last_payout_id()?;
        store.payout_seq.store(last_id, Ordering::SeqCst);
        Ok(store)
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn last_payout_id(&self) -> Result<PayoutId> {
        let cf = self.cf(CF_PAYOUTS)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (_key, value) = item?;
                let payout: PayoutRequest = decode(&value)?;
                Ok(payout.id)
            }
            None => Ok(0),
        }
    }

    fn get<T: DeserializeOwned>(&self, cf: &'static str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<T>> {
        let cf = self.cf(cf)?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| -> Result<T> {
                let (_key, value) = item?;
                decode(&value)
            })
            .collect()
    }

    fn check_append_only(&self, changes: &ChangeSet) -> Result<()> {
        let ledger_cf = self.cf(CF_LEDGER)?;
        for entry in &changes.entries {
            let key = ledger_key(entry.instructor, entry.seq);
            if self.db.get_pinned_cf(ledger_cf, key)?.is_some() {
                return Err(LedgerError::ConsistencyViolation(format!(
                    "ledger entry {} of wallet {} already written",
                    entry.seq, entry.instructor
                )));
            }
        }
        let revenue_cf = self.cf(CF_REVENUE)?;
        for record in &changes.revenue {
            if self
                .db
                .get_pinned_cf(revenue_cf, record.order_id.as_bytes())?
                .is_some()
            {
                return Err(LedgerError::ConsistencyViolation(format!(
                    "revenue for order {} already recorded",
                    record.order_id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn wallet(&self, instructor: InstructorId) -> Result<Option<Wallet>> {
        self.get(CF_WALLETS, &instructor.to_be_bytes())
    }

    async fn wallets(&self) -> Result<Vec<Wallet>> {
        self.scan(CF_WALLETS)
    }

    async fn ledger_entries(&self, instructor: InstructorId) -> Result<Vec<LedgerEntry>> {
        let cf = self.cf(CF_LEDGER)?;
        let prefix = instructor.to_be_bytes();
        let start = ledger_key(instructor, 0);

        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(&start[..], Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            entries.push(decode(&value)?);
        }
        Ok(entries)
    }

    async fn revenue_record(&self, order_id: &str) -> Result<Option<RevenueRecord>> {
        self.get(CF_REVENUE, order_id.as_bytes())
    }

    async fn payout(&self, id: PayoutId) -> Result<Option<PayoutRequest>> {
        self.get(CF_PAYOUTS, &id.to_be_bytes())
    }

    async fn payouts(&self) -> Result<Vec<PayoutRequest>> {
        self.scan(CF_PAYOUTS)
    }

    async fn payment_account(&self, instructor: InstructorId) -> Result<Option<PaymentAccount>> {
        self.get(CF_ACCOUNTS, &instructor.to_be_bytes())
    }

    async fn next_payout_id(&self) -> Result<PayoutId> {
        Ok(self.payout_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot> {
        let snapshot = self.db.snapshot();
        let read = |name: &'static str| -> Result<Vec<Vec<u8>>> {
            let cf = self.cf(name)?;
            snapshot
                .iterator_cf(cf, IteratorMode::Start)
                .map(|item| -> Result<Vec<u8>> { Ok(item?.1.into_vec()) })
                .collect()
        };
        let revenue = read(CF_REVENUE)?
            .iter()
            .map(|bytes| decode(bytes))
            .collect::<Result<_>>()?;
        let payouts = read(CF_PAYOUTS)?
            .iter()
            .map(|bytes| decode(bytes))
            .collect::<Result<_>>()?;
        Ok(LedgerSnapshot { revenue, payouts })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        self.check_append_only(&changes)?;

        let mut batch = rocksdb::WriteBatch::default();
        let wallets = self.cf(CF_WALLETS)?;
        for wallet in &changes.wallets {
            batch.put_cf(wallets, wallet.instructor().to_be_bytes(), encode(wallet)?);
        }
        let ledger = self.cf(CF_LEDGER)?;
        for entry in &changes.entries {
            batch.put_cf(ledger, ledger_key(entry.instructor, entry.seq), encode(entry)?);
        }
        let revenue = self.cf(CF_REVENUE)?;
        for record in &changes.revenue {
            batch.put_cf(revenue, record.order_id.as_bytes(), encode(record)?);
        }
        let payouts = self.cf(CF_PAYOUTS)?;
        for payout in &changes.payouts {
            batch.put_cf(payouts, payout.id.to_be_bytes(), encode(payout)?);
        }
        let accounts = self.cf(CF_ACCOUNTS)?;
        for account in &changes.accounts {
            batch.put_cf(accounts, account.instructor.to_be_bytes(), encode(account)?);
        }

        self.db.write(batch)?;
        Ok(())
    }
}
