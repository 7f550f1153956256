use crate::domain::wallet::InstructorId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SlotTable, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

/// Exclusive per-wallet locks.
///
/// Every read-modify-write of a wallet, and of the payouts it owns, runs while
/// holding that wallet's guard. Operations never hold two guards at once.
/// Different wallets proceed in parallel.
///
/// A slot lives only while some task holds or awaits it, so the table stays
/// as small as the number of wallets currently in use.
#[derive(Default)]
pub struct WalletLocks {
    slots: SlotTable<HashMap<InstructorId, Slot>>,
}

/// Held for the duration of one wallet operation.
pub struct WalletGuard<'a> {
    locks: &'a WalletLocks,
    instructor: InstructorId,
    slot: Slot,
    held: Option<OwnedMutexGuard<()>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, instructor: InstructorId) -> WalletGuard<'_> {
        // The table lock is never held across an await.
        let slot = Arc::clone(self.table().entry(instructor).or_default());
        let held = Arc::clone(&slot).lock_owned().await;
        WalletGuard {
            locks: self,
            instructor,
            slot,
            held: Some(held),
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<InstructorId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.table().len()
    }
}

impl Drop for WalletGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        let mut table = self.locks.table();
        // Waiters clone the slot under the table lock, so two references
        // (the table and this guard) mean nobody else wants it.
        if Arc::strong_count(&self.slot) == 2 {
            table.remove(&self.instructor);
        }
    }
}
