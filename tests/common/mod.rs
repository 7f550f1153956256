#![allow(dead_code)]

use course_ledger::application::auth::Caller;
use course_ledger::application::engine::LedgerEngine;
use course_ledger::domain::ledger::EntryKind;
use course_ledger::domain::money::Balance;
use course_ledger::domain::revenue::{Order, OrderStatus};
use course_ledger::domain::wallet::{InstructorId, Wallet};
use course_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

pub const EVENT_HEADER: &str = "type, instructor, course, reference, amount, upi_id";

pub fn engine() -> LedgerEngine {
    LedgerEngine::new(Box::new(InMemoryLedgerStore::new()))
}

pub fn order(order_id: &str, instructor: InstructorId, amount: Decimal) -> Order {
    Order {
        order_id: order_id.to_string(),
        course_id: 100 + instructor,
        course_title: None,
        instructor,
        amount,
        status: OrderStatus::Completed,
    }
}

/// Recognizes a completed sale and panics if it is rejected.
pub async fn sell(engine: &LedgerEngine, order_id: &str, instructor: InstructorId, amount: Decimal) {
    engine
        .recognize_revenue(&Caller::PaymentProvider, &order(order_id, instructor, amount))
        .await
        .unwrap();
}

pub async fn wallet(engine: &LedgerEngine, instructor: InstructorId) -> Wallet {
    engine.store().wallet(instructor).await.unwrap().unwrap()
}

/// Credits minus debits over the wallet's ledger history.
pub async fn ledger_balance(engine: &LedgerEngine, instructor: InstructorId) -> Balance {
    engine
        .store()
        .ledger_entries(instructor)
        .await
        .unwrap()
        .iter()
        .map(|entry| match entry.kind {
            EntryKind::Credit => Balance::from(entry.amount),
            EntryKind::Debit => Balance::ZERO - Balance::from(entry.amount),
        })
        .sum()
}

/// Writes an event CSV with the standard header followed by `rows`.
pub fn event_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{EVENT_HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}
