#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use course_ledger::application::auth::Caller;
use course_ledger::application::engine::LedgerEngine;
use course_ledger::domain::money::Balance;
use course_ledger::domain::payment_account::DestinationInput;
use course_ledger::domain::payout::PayoutStatus;
use course_ledger::infrastructure::rocksdb::RocksDBStore;
use rust_decimal_macros::dec;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: a sale and a payout request
    let csv1 = common::event_file(&[
        "sale, 1, 1, ord_1, 1250",
        "payout, 1, , , 300, tutor@upi",
    ]);

    let output1 = Command::new(cargo_bin!("course-ledger"))
        .arg("replay")
        .arg(csv1.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("1,1000.00,300.00,700.00,1000.00"));

    // 2. Second run: settle the payout from the first run and redeliver the sale
    let csv2 = common::event_file(&["sale, 1, 1, ord_1, 1250", "paid, , , 1"]);

    let output2 = Command::new(cargo_bin!("course-ledger"))
        .arg("replay")
        .arg(csv2.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    // The duplicate sale is ignored and the recovered reservation is settled
    assert!(stdout2.contains("1,700.00,0.00,700.00,1000.00"));
}

#[tokio::test]
async fn test_payout_ids_resume_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger_db");

    {
        let engine = LedgerEngine::new(Box::new(RocksDBStore::open(&path).unwrap()));
        common::sell(&engine, "ord_1", 2, dec!(1000)).await;
        for _ in 0..2 {
            engine
                .request_payout(
                    &Caller::Instructor(2),
                    dec!(100),
                    DestinationInput::upi("two@upi"),
                )
                .await
                .unwrap();
        }
    }

    let engine = LedgerEngine::new(Box::new(RocksDBStore::open(&path).unwrap()));
    let receipt = engine
        .request_payout(&Caller::Instructor(2), dec!(100), DestinationInput::default())
        .await
        .unwrap();
    assert_eq!(receipt.payout.id, 3);

    let pending = engine.pending_payouts(&Caller::Admin).await.unwrap();
    assert_eq!(pending.len(), 3);
    assert!(pending.iter().all(|p| p.status == PayoutStatus::Pending));

    let wallet = common::wallet(&engine, 2).await;
    assert_eq!(wallet.pending(), Balance::new(dec!(300)));
    assert_eq!(common::ledger_balance(&engine, 2).await, wallet.available());
}
