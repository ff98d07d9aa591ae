use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn reckon(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reckon").unwrap();
    cmd.env("RECKON_DATA_DIR", data_dir);
    cmd
}

fn open_db(data_dir: &Path) -> rusqlite::Connection {
    rusqlite::Connection::open(data_dir.join("reckon.db")).unwrap()
}

fn init_with_demo(data_dir: &Path) {
    reckon(data_dir).arg("init").assert().success();
    reckon(data_dir)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Demo data loaded."));
}

#[test]
fn init_creates_database() {
    let dir = tempfile::tempdir().unwrap();
    reckon(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));
    assert!(dir.path().join("reckon.db").exists());
}

#[test]
fn demo_seeds_and_status_reports() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    reckon(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Accounts:\s+4").unwrap())
        .stdout(predicate::str::is_match(r"Pending candidates:\s+2").unwrap());

    // Demo is idempotent.
    reckon(dir.path())
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("already loaded"));
}

#[test]
fn accounts_listing_shows_polarity() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    reckon(dir.path())
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Team Card"))
        .stdout(predicate::str::contains("liability"));
}

#[test]
fn reconcile_balanced_statement() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    // Statement 1 is the demo checking statement, seeded to balance.
    reckon(dir.path())
        .args(["reconcile", "--statement", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reconciled!"));
}

#[test]
fn reconcile_discrepant_statement() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    // Statement 3 is the demo card statement, seeded 4.50 off.
    reckon(dir.path())
        .args(["reconcile", "--statement", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DISCREPANCY"))
        .stdout(predicate::str::contains("$4.50"));
}

#[test]
fn reconcile_unknown_statement_fails() {
    let dir = tempfile::tempdir().unwrap();
    reckon(dir.path()).arg("init").assert().success();
    reckon(dir.path())
        .args(["reconcile", "--statement", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown statement"));
}

#[test]
fn transfers_list_flags_cross_company() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    reckon(dir.path())
        .args(["transfers", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auto_linked"))
        .stdout(predicate::str::contains("cross-co"));
}

#[test]
fn transfers_confirm_links_both_legs() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    let (candidate_id, from_id, to_id) = {
        let conn = open_db(dir.path());
        conn.query_row(
            "SELECT id, from_transaction_id, to_transaction_id FROM transfer_candidates \
             WHERE status = 'pending' AND is_cross_company = 1",
            [],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, i64>(2)?)),
        )
        .unwrap()
    };

    reckon(dir.path())
        .args(["transfers", "confirm", &candidate_id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Confirmed"));

    let conn = open_db(dir.path());
    let (from_link, from_type): (Option<i64>, Option<String>) = conn
        .query_row(
            "SELECT linked_to, link_type FROM transactions WHERE id = ?1",
            [from_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    let (to_link, to_type): (Option<i64>, Option<String>) = conn
        .query_row(
            "SELECT linked_to, link_type FROM transactions WHERE id = ?1",
            [to_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(from_link, Some(to_id));
    assert_eq!(to_link, Some(from_id));
    assert_eq!(from_type.as_deref(), Some("transfer_out"));
    assert_eq!(to_type.as_deref(), Some("transfer_in"));

    // Confirming twice is refused.
    reckon(dir.path())
        .args(["transfers", "confirm", &candidate_id.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not pending"));
}

#[test]
fn transfers_reject_keeps_transactions_untouched() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    let (candidate_id, from_id) = {
        let conn = open_db(dir.path());
        conn.query_row(
            "SELECT id, from_transaction_id FROM transfer_candidates \
             WHERE status = 'pending' AND is_cross_company = 0",
            [],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)),
        )
        .unwrap()
    };

    reckon(dir.path())
        .args([
            "transfers",
            "reject",
            &candidate_id.to_string(),
            "--reason",
            "vendor payout, not a transfer",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rejected"));

    let conn = open_db(dir.path());
    let (status, reason): (String, Option<String>) = conn
        .query_row(
            "SELECT status, reject_reason FROM transfer_candidates WHERE id = ?1",
            [candidate_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(status, "rejected");
    assert_eq!(reason.as_deref(), Some("vendor payout, not a transfer"));

    let link: Option<i64> = conn
        .query_row("SELECT linked_to FROM transactions WHERE id = ?1", [from_id], |r| r.get(0))
        .unwrap();
    assert_eq!(link, None);
}

#[test]
fn import_then_reconcile_round() {
    let dir = tempfile::tempdir().unwrap();
    reckon(dir.path()).arg("init").assert().success();
    reckon(dir.path())
        .args(["accounts", "add", "Main Checking", "--type", "checking"])
        .assert()
        .success();

    let file = dir.path().join("june.json");
    std::fs::write(
        &file,
        r#"[
            {"date": "2025-06-03", "description": "STRIPE PAYOUT", "amount": 1200.00, "direction": "credit", "suggested_category": "Client Revenue"},
            {"date": "2025-06-05", "description": "GITHUB INC", "amount": -21.00, "direction": "debit"},
            {"date": "2025-06-10", "description": "OFFICE RENT", "amount": -1800.00, "direction": "debit"}
        ]"#,
    )
    .unwrap();

    reckon(dir.path())
        .args([
            "import",
            file.to_str().unwrap(),
            "--account",
            "Main Checking",
            "--opening",
            "1000",
            "--closing",
            "379",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 transactions"));

    reckon(dir.path())
        .args(["reconcile", "--statement", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reconciled!"));

    // Re-importing the identical file is refused.
    reckon(dir.path())
        .args([
            "import",
            file.to_str().unwrap(),
            "--account",
            "Main Checking",
            "--opening",
            "1000",
            "--closing",
            "379",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate import"));
}

#[test]
fn register_filters_by_review_flag() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    reckon(dir.path())
        .args(["register", "--account", "Operating Checking", "--needs-review"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GITHUB INC"))
        // the auto-linked transfer leg is no longer awaiting review
        .stdout(predicate::str::contains("ONLINE TRANSFER TO SAVINGS").not());
}

#[test]
fn statements_listing_shows_verdicts() {
    let dir = tempfile::tempdir().unwrap();
    init_with_demo(dir.path());

    reckon(dir.path())
        .args(["reconcile", "--statement", "1"])
        .assert()
        .success();

    reckon(dir.path())
        .arg("statements")
        .assert()
        .success()
        .stdout(predicate::str::contains("balanced"))
        .stdout(predicate::str::contains("Operating Checking"));
}

#[test]
fn completions_generate() {
    let dir = tempfile::tempdir().unwrap();
    reckon(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reckon"));
}
