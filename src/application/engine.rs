use super::auth::Caller;
use super::locks::WalletLocks;
use crate::config::EngineConfig;
use crate::domain::event::{EventType, LedgerEvent};
use crate::domain::payment_account::DestinationInput;
use crate::domain::payout::PayoutId;
use crate::domain::ports::{ChangeSet, LedgerStore, LedgerStoreBox};
use crate::domain::revenue::{Order, OrderStatus};
use crate::domain::wallet::Wallet;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;

/// Outcome of an operation that is safe to repeat.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed<T> {
    Applied(T),
    /// The operation had already taken effect; nothing changed.
    AlreadyProcessed(T),
}

impl<T> Processed<T> {
    pub fn is_already_processed(&self) -> bool {
        matches!(self, Self::AlreadyProcessed(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Applied(value) | Self::AlreadyProcessed(value) => value,
        }
    }
}

/// Logs consistency violations on their way out of an operation.
pub(crate) fn surface<T>(result: Result<T>) -> Result<T> {
    if let Err(LedgerError::ConsistencyViolation(detail)) = &result {
        tracing::error!(%detail, "ledger consistency violation, operation aborted");
    }
    result
}

/// The commission, wallet and payout engine.
///
/// `LedgerEngine` owns the storage backend and the per-wallet lock table. The
/// commission engine and the payout workflow share the same locks, so neither
/// can bypass the other's critical section.
pub struct LedgerEngine {
    pub(crate) store: LedgerStoreBox,
    pub(crate) locks: WalletLocks,
    pub(crate) config: EngineConfig,
}

impl LedgerEngine {
    /// Creates an engine with the default commission rate.
    pub fn new(store: LedgerStoreBox) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: LedgerStoreBox, config: EngineConfig) -> Self {
        Self {
            store,
            locks: WalletLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    pub(crate) async fn commit(&self, changes: ChangeSet) -> Result<()> {
        self.store.commit(changes).await
    }

    /// Runs one replayed event through the same operation the HTTP surface
    /// would call, with the capability the event's origin holds.
    pub async fn apply_event(&self, event: LedgerEvent) -> Result<()> {
        match event.r#type {
            EventType::Sale => {
                let order = Order {
                    order_id: required(event.reference, "reference")?,
                    course_id: required(event.course, "course")?,
                    course_title: None,
                    instructor: required(event.instructor, "instructor")?,
                    amount: required(event.amount, "amount")?,
                    status: OrderStatus::Completed,
                };
                let outcome = self
                    .recognize_revenue(&Caller::PaymentProvider, &order)
                    .await?;
                if outcome.is_already_processed() {
                    tracing::info!(order_id = %order.order_id, "duplicate sale ignored");
                }
            }
            EventType::Payout => {
                let instructor = required(event.instructor, "instructor")?;
                let amount: Decimal = required(event.amount, "amount")?;
                let destination = DestinationInput {
                    upi_id: event.upi_id,
                    ..DestinationInput::default()
                };
                self.request_payout(&Caller::Instructor(instructor), amount, destination)
                    .await?;
            }
            EventType::Approve => {
                self.approve(&Caller::Admin, payout_id(event.reference)?)
                    .await?;
            }
            EventType::Paid => {
                let outcome = self
                    .mark_paid(&Caller::Admin, payout_id(event.reference)?)
                    .await?;
                if outcome.is_already_processed() {
                    tracing::info!(payout_id = outcome.into_inner().id, "payout already paid");
                }
            }
            EventType::Reject => {
                self.reject(&Caller::Admin, payout_id(event.reference)?)
                    .await?;
            }
        }
        Ok(())
    }

    /// Consumes the engine and returns the final state of all wallets.
    pub async fn into_results(self) -> Result<Vec<Wallet>> {
        self.store.wallets().await
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or_else(|| LedgerError::Validation {
        message: format!("event is missing {field}"),
        fields: vec![field],
    })
}

fn payout_id(reference: Option<String>) -> Result<PayoutId> {
    let reference = required(reference, "reference")?;
    reference.parse().map_err(|_| LedgerError::Validation {
        message: format!("{reference:?} is not a payout id"),
        fields: vec!["reference"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    fn engine() -> LedgerEngine {
        LedgerEngine::new(Box::new(InMemoryLedgerStore::new()))
    }

    fn event(kind: EventType) -> LedgerEvent {
        LedgerEvent {
            r#type: kind,
            instructor: None,
            course: None,
            reference: None,
            amount: None,
            upi_id: None,
        }
    }

    fn sale(order: &str, instructor: u64, amount: Decimal) -> LedgerEvent {
        LedgerEvent {
            instructor: Some(instructor),
            course: Some(10),
            reference: Some(order.to_string()),
            amount: Some(amount),
            ..event(EventType::Sale)
        }
    }

    #[tokio::test]
    async fn test_duplicate_sale_events() {
        let engine = engine();

        engine.apply_event(sale("ord_1", 1, dec!(100))).await.unwrap();
        engine.apply_event(sale("ord_1", 1, dec!(100))).await.unwrap();

        let results = engine.into_results().await.unwrap();
        let wallet = results.iter().find(|w| w.instructor() == 1).unwrap();
        // Should be 80.00, not 160.00
        assert_eq!(wallet.available(), Balance::new(dec!(80)));
    }

    #[tokio::test]
    async fn test_event_flow_through_settlement() {
        let engine = engine();
        engine.apply_event(sale("ord_1", 1, dec!(1000))).await.unwrap();
        engine
            .apply_event(LedgerEvent {
                instructor: Some(1),
                amount: Some(dec!(300)),
                upi_id: Some("tutor@upi".into()),
                ..event(EventType::Payout)
            })
            .await
            .unwrap();
        engine
            .apply_event(LedgerEvent {
                reference: Some("1".into()),
                ..event(EventType::Paid)
            })
            .await
            .unwrap();

        let wallet = engine.store().wallet(1).await.unwrap().unwrap();
        assert_eq!(wallet.available(), Balance::new(dec!(500)));
        assert_eq!(wallet.pending(), Balance::ZERO);
    }

    #[tokio::test]
    async fn test_malformed_events_are_validation_errors() {
        let engine = engine();
        let missing_amount = LedgerEvent {
            amount: None,
            ..sale("ord_1", 1, dec!(1))
        };
        assert!(matches!(
            engine.apply_event(missing_amount).await,
            Err(LedgerError::Validation { fields, .. }) if fields == vec!["amount"]
        ));

        let bad_reference = LedgerEvent {
            reference: Some("abc".into()),
            ..event(EventType::Reject)
        };
        assert!(matches!(
            engine.apply_event(bad_reference).await,
            Err(LedgerError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_many_instructors() {
        let engine = engine();
        for i in 1..=100u64 {
            engine
                .apply_event(sale(&format!("ord_{i}"), i, dec!(1.25)))
                .await
                .unwrap();
        }

        let results = engine.into_results().await.unwrap();
        assert_eq!(results.len(), 100);
        for wallet in results {
            assert_eq!(wallet.available(), Balance::new(dec!(1.00)));
        }
    }
}
