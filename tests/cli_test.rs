use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let events = common::event_file(&[
        "sale, 1, 10, ord_1, 1250",
        "sale, 2, 20, ord_2, 99.99",
        "payout, 1, , , 400, tutor@upi",
        "payout, 1, , , 100, ",
        "paid, , , 1",
        "approve, , , 2",
    ]);

    let mut cmd = Command::new(cargo_bin!("course-ledger"));
    cmd.arg("replay").arg(events.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "instructor,available,pending,withdrawable,total_earned",
        ))
        .stdout(predicate::str::contains("1,600.00,100.00,500.00,1000.00"))
        // Commission of 19.998 rounds to 20.00
        .stdout(predicate::str::contains("2,79.99,0.00,79.99,79.99"));

    Ok(())
}

#[test]
fn test_commission_percent_flag() {
    let events = common::event_file(&["sale, 1, 10, ord_1, 1000"]);

    let mut cmd = Command::new(cargo_bin!("course-ledger"));
    cmd.arg("--commission-percent")
        .arg("12.5")
        .arg("replay")
        .arg(events.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,875.00,0.00,875.00,875.00"));
}

#[test]
fn test_commission_percent_out_of_range() {
    let events = common::event_file(&["sale, 1, 10, ord_1, 1000"]);

    let mut cmd = Command::new(cargo_bin!("course-ledger"));
    cmd.env("LEDGER_COMMISSION_PERCENT", "120")
        .arg("replay")
        .arg(events.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("commission percent"));
}

#[test]
fn test_missing_input_file() {
    let mut cmd = Command::new(cargo_bin!("course-ledger"));
    cmd.arg("replay").arg("does/not/exist.csv");

    cmd.assert().failure();
}
