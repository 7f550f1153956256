use super::auth::Caller;
use super::engine::{LedgerEngine, Processed, surface};
use super::locks::WalletGuard;
use crate::domain::ledger::payout_reference;
use crate::domain::money::{Amount, Balance};
use crate::domain::payment_account::{DestinationInput, PaymentAccount};
use crate::domain::payout::{PayoutAction, PayoutId, PayoutRequest, Transition};
use crate::domain::ports::ChangeSet;
use crate::domain::wallet::{InstructorId, Wallet};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

/// What an instructor gets back from a successful payout request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutReceipt {
    pub payout: PayoutRequest,
    pub amount_blocked: Amount,
    pub new_withdrawable_balance: Balance,
}

impl LedgerEngine {
    /// Reserves `amount` of the caller's withdrawable balance for a new PENDING
    /// payout.
    ///
    /// Destination fields that are supplied are merged onto the caller's
    /// payment account first; the merged account must hold a UPI id or a full
    /// bank tuple. The balance check, the account update, the payout row and
    /// the reservation are committed together under the wallet lock.
    #[instrument(skip(self, destination))]
    pub async fn request_payout(
        &self,
        caller: &Caller,
        amount: Decimal,
        destination: DestinationInput,
    ) -> Result<PayoutReceipt> {
        surface(self.request(caller, amount, destination).await)
    }

    async fn request(
        &self,
        caller: &Caller,
        amount: Decimal,
        destination: DestinationInput,
    ) -> Result<PayoutReceipt> {
        let instructor = caller.instructor_id()?;
        let amount = Amount::new(amount)?;

        let _guard = self.locks.lock(instructor).await;
        let mut account = self.account_or_default(instructor).await?;
        let account_changed = account.merge(&destination);
        account.ensure_destination()?;

        let mut wallet = self
            .store
            .wallet(instructor)
            .await?
            .unwrap_or_else(|| Wallet::new(instructor));
        let withdrawable = wallet.withdrawable();
        if !withdrawable.is_positive() || Balance::from(amount) > withdrawable {
            return Err(LedgerError::InsufficientFunds {
                requested: amount.into(),
                withdrawable,
            });
        }

        let payout = PayoutRequest::new(self.store.next_payout_id().await?, instructor, amount);
        wallet.reserve(amount)?;
        let new_withdrawable_balance = wallet.withdrawable();

        let mut changes = ChangeSet::new();
        changes.wallets.push(wallet);
        changes.payouts.push(payout.clone());
        if account_changed {
            changes.accounts.push(account);
        }
        self.commit(changes).await?;

        info!(
            payout_id = payout.id,
            %amount,
            withdrawable = %new_withdrawable_balance,
            "funds reserved for payout"
        );
        Ok(PayoutReceipt {
            payout,
            amount_blocked: amount,
            new_withdrawable_balance,
        })
    }

    /// Moves a PENDING payout to APPROVED. Money is untouched.
    #[instrument(skip(self))]
    pub async fn approve(&self, caller: &Caller, payout_id: PayoutId) -> Result<PayoutRequest> {
        caller.require_admin()?;
        let (_guard, mut payout) = self.lock_payout(payout_id).await?;
        if let Transition::To(status) = payout.transition(PayoutAction::Approve)? {
            payout.set_status(status);
            self.commit(ChangeSet {
                payouts: vec![payout.clone()],
                ..ChangeSet::new()
            })
            .await?;
            info!("payout approved");
        }
        Ok(payout)
    }

    /// Records that a PENDING or APPROVED payout was transferred: debits the
    /// wallet and marks the payout PAID. A second call on a PAID payout is an
    /// idempotent `AlreadyProcessed`.
    #[instrument(skip(self))]
    pub async fn mark_paid(
        &self,
        caller: &Caller,
        payout_id: PayoutId,
    ) -> Result<Processed<PayoutRequest>> {
        surface(self.settle(caller, payout_id).await)
    }

    async fn settle(&self, caller: &Caller, payout_id: PayoutId) -> Result<Processed<PayoutRequest>> {
        caller.require_admin()?;
        let (_guard, mut payout) = self.lock_payout(payout_id).await?;
        let status = match payout.transition(PayoutAction::MarkPaid)? {
            Transition::To(status) => status,
            Transition::AlreadyApplied => return Ok(Processed::AlreadyProcessed(payout)),
        };

        self.account_or_default(payout.instructor)
            .await?
            .ensure_destination()?;
        let mut wallet = self.owning_wallet(&payout).await?;
        let entry = wallet.debit(payout.amount, payout_reference(payout.id))?;
        payout.set_status(status);

        self.commit(ChangeSet {
            wallets: vec![wallet],
            entries: vec![entry],
            payouts: vec![payout.clone()],
            ..ChangeSet::new()
        })
        .await?;

        info!(amount = %payout.amount, "payout marked paid");
        Ok(Processed::Applied(payout))
    }

    /// Rejects a PENDING payout and releases its reservation. No ledger entry
    /// is written because no money moved.
    #[instrument(skip(self))]
    pub async fn reject(&self, caller: &Caller, payout_id: PayoutId) -> Result<PayoutRequest> {
        surface(self.decline(caller, payout_id).await)
    }

    async fn decline(&self, caller: &Caller, payout_id: PayoutId) -> Result<PayoutRequest> {
        caller.require_admin()?;
        let (_guard, mut payout) = self.lock_payout(payout_id).await?;
        let Transition::To(status) = payout.transition(PayoutAction::Reject)? else {
            return Ok(payout);
        };

        let mut wallet = self.owning_wallet(&payout).await?;
        wallet.release(payout.amount)?;
        payout.set_status(status);

        self.commit(ChangeSet {
            wallets: vec![wallet],
            payouts: vec![payout.clone()],
            ..ChangeSet::new()
        })
        .await?;

        info!(amount = %payout.amount, "payout rejected, reservation released");
        Ok(payout)
    }

    /// The caller's payment account; empty when nothing is on file.
    pub async fn payment_account(&self, caller: &Caller) -> Result<PaymentAccount> {
        let instructor = caller.instructor_id()?;
        self.account_or_default(instructor).await
    }

    /// Merges the supplied destination fields onto the caller's account.
    #[instrument(skip(self, input))]
    pub async fn update_payment_account(
        &self,
        caller: &Caller,
        input: DestinationInput,
    ) -> Result<PaymentAccount> {
        let instructor = caller.instructor_id()?;
        if input.is_empty() {
            return Err(LedgerError::Validation {
                message: "no payment destination fields supplied".to_string(),
                fields: vec!["upi_id", "account_holder_name", "account_number", "routing_code"],
            });
        }

        let _guard = self.locks.lock(instructor).await;
        let mut account = self.account_or_default(instructor).await?;
        if account.merge(&input) {
            self.commit(ChangeSet {
                accounts: vec![account.clone()],
                ..ChangeSet::new()
            })
            .await?;
            info!("payment account updated");
        }
        Ok(account)
    }

    async fn account_or_default(&self, instructor: InstructorId) -> Result<PaymentAccount> {
        Ok(self
            .store
            .payment_account(instructor)
            .await?
            .unwrap_or_else(|| PaymentAccount::new(instructor)))
    }

    async fn owning_wallet(&self, payout: &PayoutRequest) -> Result<Wallet> {
        self.store.wallet(payout.instructor).await?.ok_or_else(|| {
            LedgerError::ConsistencyViolation(format!(
                "payout {} holds a reservation but wallet {} does not exist",
                payout.id, payout.instructor
            ))
        })
    }

    // The owner of a payout never changes, so it is safe to read it before
    // locking. The payout itself is re-read under the owner's wallet lock.
    async fn lock_payout(&self, payout_id: PayoutId) -> Result<(WalletGuard<'_>, PayoutRequest)> {
        let owner = self
            .store
            .payout(payout_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("payout", payout_id))?
            .instructor;
        let guard = self.locks.lock(owner).await;
        let payout = self
            .store
            .payout(payout_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("payout", payout_id))?;
        Ok((guard, payout))
    }
}
