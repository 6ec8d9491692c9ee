// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use duoledger::{
    cli,
    commands::{doctor, fixed},
    db,
};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO households(id, name) VALUES (1, 'Casa');
        INSERT INTO settings(key, value) VALUES ('active_household', '1');
        INSERT INTO users(id, household_id, name) VALUES (1, 1, 'Ana');
        INSERT INTO accounts(id, household_id, name, type) VALUES (1, 1, 'Checking', 'bank');
        INSERT INTO categories(id, household_id, name) VALUES (1, 1, 'Home');
        INSERT INTO fixed_expenses(id, household_id, description, amount, due_day, category_id, account_id)
            VALUES (1, 1, 'Rent', '1200.00', 31, 1, 1);
        "#,
    )
    .unwrap();
    conn
}

fn run_fixed(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    match matches.subcommand() {
        Some(("fixed", sub)) => fixed::handle(conn, sub),
        _ => panic!("no fixed subcommand"),
    }
}

fn occurrence_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM fixed_expense_occurrences", [], |r| {
        r.get(0)
    })
    .unwrap()
}

#[test]
fn materialize_is_idempotent() {
    let conn = setup();
    assert_eq!(fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap(), 1);
    assert_eq!(fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap(), 0);
    assert_eq!(occurrence_count(&conn), 1);
}

#[test]
fn occurrence_due_date_clamps_short_months() {
    let conn = setup();
    fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap();
    fixed::ensure_occurrences(&conn, 1, 2026, 4).unwrap();
    let feb: String = conn
        .query_row(
            "SELECT due_date FROM fixed_expense_occurrences WHERE month=2",
            [],
            |r| r.get(0),
        )
        .unwrap();
    let apr: String = conn
        .query_row(
            "SELECT due_date FROM fixed_expense_occurrences WHERE month=4",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(feb, "2026-02-28");
    assert_eq!(apr, "2026-04-30");
}

#[test]
fn inactive_templates_are_skipped() {
    let conn = setup();
    conn.execute("UPDATE fixed_expenses SET is_active=0 WHERE id=1", [])
        .unwrap();
    assert_eq!(fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap(), 0);
    assert_eq!(occurrence_count(&conn), 0);
}

#[test]
fn paying_records_and_links_transaction() {
    let mut conn = setup();
    fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap();
    let occ: i64 = conn
        .query_row("SELECT id FROM fixed_expense_occurrences", [], |r| r.get(0))
        .unwrap();

    let txn_id = fixed::pay_occurrence(&mut conn, 1, occ, Some(1)).unwrap();

    let (desc, amount, kind, date, recurring, recurrence, user_id): (
        String,
        String,
        String,
        String,
        i64,
        String,
        i64,
    ) = conn
        .query_row(
            "SELECT description, amount, type, date, is_recurring, recurrence_type, user_id
             FROM transactions WHERE id=?1",
            [txn_id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .unwrap();
    assert_eq!(desc, "Rent");
    assert_eq!(amount, "1200.00");
    assert_eq!(kind, "expense");
    assert_eq!(date, "2026-02-28");
    assert_eq!(recurring, 1);
    assert_eq!(recurrence, "monthly");
    assert_eq!(user_id, 1);

    let (status, linked, stamped): (String, i64, i64) = conn
        .query_row(
            "SELECT status, transaction_id, paid_at IS NOT NULL FROM fixed_expense_occurrences WHERE id=?1",
            [occ],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(status, "paid");
    assert_eq!(linked, txn_id);
    assert_eq!(stamped, 1);
}

#[test]
fn paying_twice_fails_without_new_rows() {
    let mut conn = setup();
    fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap();
    let occ: i64 = conn
        .query_row("SELECT id FROM fixed_expense_occurrences", [], |r| r.get(0))
        .unwrap();
    fixed::pay_occurrence(&mut conn, 1, occ, None).unwrap();

    let err = fixed::pay_occurrence(&mut conn, 1, occ, None).unwrap_err();
    assert!(err.to_string().contains("already paid"));
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn paying_unknown_occurrence_fails() {
    let mut conn = setup();
    let err = fixed::pay_occurrence(&mut conn, 1, 99, None).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn ensure_leaves_paid_rows_alone() {
    let mut conn = setup();
    fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap();
    let occ: i64 = conn
        .query_row("SELECT id FROM fixed_expense_occurrences", [], |r| r.get(0))
        .unwrap();
    fixed::pay_occurrence(&mut conn, 1, occ, None).unwrap();

    assert_eq!(fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap(), 0);
    let status: String = conn
        .query_row(
            "SELECT status FROM fixed_expense_occurrences WHERE id=?1",
            [occ],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(status, "paid");
}

#[test]
fn editing_refreshes_pending_occurrences_only() {
    let mut conn = setup();
    fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap();
    fixed::ensure_occurrences(&conn, 1, 2026, 3).unwrap();
    let feb: i64 = conn
        .query_row(
            "SELECT id FROM fixed_expense_occurrences WHERE month=2",
            [],
            |r| r.get(0),
        )
        .unwrap();
    fixed::pay_occurrence(&mut conn, 1, feb, None).unwrap();

    run_fixed(
        &mut conn,
        &[
            "duoledger", "fixed", "edit", "--id", "1", "--amount", "1.300,00", "--due-day", "15",
        ],
    )
    .unwrap();

    let (feb_amount, feb_due): (String, String) = conn
        .query_row(
            "SELECT amount, due_date FROM fixed_expense_occurrences WHERE month=2",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(feb_amount, "1200.00");
    assert_eq!(feb_due, "2026-02-28");

    let (mar_amount, mar_due): (String, String) = conn
        .query_row(
            "SELECT amount, due_date FROM fixed_expense_occurrences WHERE month=3",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(mar_amount, "1300.00");
    assert_eq!(mar_due, "2026-03-15");
}

#[test]
fn deactivation_cancels_pending_occurrences() {
    let mut conn = setup();
    fixed::ensure_occurrences(&conn, 1, 2026, 2).unwrap();
    fixed::ensure_occurrences(&conn, 1, 2026, 3).unwrap();
    let feb: i64 = conn
        .query_row(
            "SELECT id FROM fixed_expense_occurrences WHERE month=2",
            [],
            |r| r.get(0),
        )
        .unwrap();
    fixed::pay_occurrence(&mut conn, 1, feb, None).unwrap();

    run_fixed(
        &mut conn,
        &["duoledger", "fixed", "edit", "--id", "1", "--deactivate"],
    )
    .unwrap();

    let pending: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM fixed_expense_occurrences WHERE status='pending'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(pending, 0);
    let paid: String = conn
        .query_row(
            "SELECT status FROM fixed_expense_occurrences WHERE id=?1",
            [feb],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(paid, "paid");
    assert!(doctor::scan(&conn).unwrap().is_empty());
}

#[test]
fn add_requires_one_payment_method() {
    let mut conn = setup();
    let err = run_fixed(
        &mut conn,
        &[
            "duoledger", "fixed", "add", "--description", "Internet", "--amount", "99,90",
            "--due-day", "12",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("payment method"));

    let err = run_fixed(
        &mut conn,
        &[
            "duoledger", "fixed", "add", "--description", "Internet", "--amount", "99,90",
            "--due-day", "12", "--account", "Checking", "--card", "Violet",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("not both"));

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM fixed_expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}

#[test]
fn add_validates_due_day_range() {
    let mut conn = setup();
    for bad in ["0", "32"] {
        let err = run_fixed(
            &mut conn,
            &[
                "duoledger", "fixed", "add", "--description", "Internet", "--amount", "99,90",
                "--due-day", bad,
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("between 1 and 31"));
    }
}

#[test]
fn due_command_materializes_and_lists() {
    let mut conn = setup();
    run_fixed(&mut conn, &["duoledger", "fixed", "due", "--month", "2026-02"]).unwrap();
    assert_eq!(occurrence_count(&conn), 1);

    let rows = fixed::occurrence_rows(&conn, 1, 2026, 2).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "Rent");
    assert_eq!(rows[0].amount, "1.200,00");
    assert_eq!(rows[0].status, "pending");
    assert_eq!(rows[0].due_date, "2026-02-28");
    assert!(rows[0].paid_at.is_none());
}
