use super::auth::Caller;
use super::engine::{LedgerEngine, Processed, surface};
use crate::domain::ledger::order_reference;
use crate::domain::money::Amount;
use crate::domain::ports::ChangeSet;
use crate::domain::revenue::{CommissionSplit, Order, RevenueRecord, completed_sale_amount};
use crate::domain::wallet::Wallet;
use crate::error::Result;
use chrono::Utc;
use tracing::{info, instrument};

impl LedgerEngine {
    /// Records the platform commission for a completed order and credits the
    /// instructor's share to their wallet.
    ///
    /// Repeated delivery of the same order returns the existing record as
    /// `AlreadyProcessed` without touching the wallet.
    #[instrument(skip(self, order), fields(order_id = %order.order_id, instructor = order.instructor))]
    pub async fn recognize_revenue(
        &self,
        caller: &Caller,
        order: &Order,
    ) -> Result<Processed<RevenueRecord>> {
        surface(self.recognize(caller, order).await)
    }

    async fn recognize(&self, caller: &Caller, order: &Order) -> Result<Processed<RevenueRecord>> {
        caller.require_payment_provider()?;
        let total = completed_sale_amount(order)?;

        let _guard = self.locks.lock(order.instructor).await;
        if let Some(existing) = self.store.revenue_record(&order.order_id).await? {
            return Ok(Processed::AlreadyProcessed(existing));
        }

        let split = CommissionSplit::compute(total, self.config.commission_rate);
        let record = RevenueRecord {
            order_id: order.order_id.clone(),
            course_id: order.course_id,
            course_title: order.course_title.clone(),
            instructor: order.instructor,
            total_amount: split.total,
            commission_amount: split.commission,
            created_at: Utc::now(),
        };

        let mut wallet = self
            .store
            .wallet(order.instructor)
            .await?
            .unwrap_or_else(|| Wallet::new(order.instructor));
        let mut changes = ChangeSet::new();
        // A 100% commission leaves nothing to credit.
        if split.instructor_share.is_positive() {
            let share = Amount::new(split.instructor_share.value())?;
            changes
                .entries
                .push(wallet.credit(share, order_reference(&order.order_id))?);
        }
        changes.wallets.push(wallet);
        changes.revenue.push(record.clone());
        self.commit(changes).await?;

        info!(
            total = %split.total,
            commission = %split.commission,
            share = %split.instructor_share,
            "revenue recognized"
        );
        Ok(Processed::Applied(record))
    }
}
