// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use duoledger::{commands::doctor, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO households(id, name) VALUES (1, 'Casa');
        INSERT INTO fixed_expenses(id, household_id, description, amount, due_day, is_active)
            VALUES (1, 1, 'Rent', '100.00', 10, 1);
        INSERT INTO fixed_expenses(id, household_id, description, amount, due_day, is_active)
            VALUES (2, 1, 'Gym', '50.00', 5, 0);
        "#,
    )
    .unwrap();
    conn
}

#[test]
fn clean_database_reports_nothing() {
    let conn = setup();
    // a correctly linked paid occurrence passes
    conn.execute_batch(
        r#"
        INSERT INTO transactions(id, household_id, description, amount, type, date, is_recurring, recurrence_type)
            VALUES (20, 1, 'Rent', '100.00', 'expense', '2026-02-10', 1, 'monthly');
        INSERT INTO fixed_expense_occurrences(id, fixed_expense_id, household_id, month, year, due_date, amount, status, paid_at, transaction_id)
            VALUES (1, 1, 1, 2, 2026, '2026-02-10', '100.00', 'paid', '2026-02-10 09:00:00', 20);
        "#,
    )
    .unwrap();
    assert!(doctor::scan(&conn).unwrap().is_empty());
}

#[test]
fn flags_each_inconsistency() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO fixed_expense_occurrences(id, fixed_expense_id, household_id, month, year, due_date, amount, status)
            VALUES (1, 1, 1, 2, 2026, '2026-02-10', '100.00', 'paid');
        INSERT INTO fixed_expense_occurrences(id, fixed_expense_id, household_id, month, year, due_date, amount, status)
            VALUES (2, 2, 1, 2, 2026, '2026-02-05', '50.00', 'pending');
        INSERT INTO transactions(id, household_id, description, amount, type, date,
                                 is_third_party, third_party_name, third_party_status)
            VALUES (10, 1, 'Dinner', '30.00', 'expense', '2026-02-01', 1, 'Rui', 'paid');
        INSERT INTO transactions(id, household_id, description, amount, type, date,
                                 is_third_party, third_party_status)
            VALUES (11, 1, 'Taxi', '15.00', 'expense', '2026-02-02', 1, 'pending');
        INSERT INTO transactions(id, household_id, description, amount, type, date, is_recurring, recurrence_type)
            VALUES (12, 1, 'TV (1/3)', '100.00', 'expense', '2026-02-03', 1, 'installment');
        INSERT INTO transactions(id, household_id, description, amount, type, date, is_recurring, recurrence_type,
                                 installment_id, installment_number, total_installments)
            VALUES (13, 1, 'Desk (1/3)', '70.00', 'expense', '2026-02-04', 1, 'installment', 'g1', 1, 3);
        INSERT INTO transactions(id, household_id, description, amount, type, date, is_recurring, recurrence_type,
                                 installment_id, installment_number, total_installments)
            VALUES (14, 1, 'Desk (2/3)', '70.00', 'expense', '2026-03-04', 1, 'installment', 'g1', 2, 3);
        "#,
    )
    .unwrap();

    let rows = doctor::scan(&conn).unwrap();
    let issues: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    for expected in [
        "paid_occurrence_unlinked",
        "third_party_paid_no_timestamp",
        "third_party_missing_name",
        "installment_missing_group",
        "installment_gap",
        "pending_inactive_template",
    ] {
        assert!(issues.contains(&expected), "missing issue {}", expected);
    }
}

#[test]
fn complete_installment_group_passes() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO transactions(id, household_id, description, amount, type, date, is_recurring, recurrence_type,
                                 installment_id, installment_number, total_installments)
            VALUES (13, 1, 'Desk (1/2)', '70.00', 'expense', '2026-02-04', 1, 'installment', 'g1', 1, 2);
        INSERT INTO transactions(id, household_id, description, amount, type, date, is_recurring, recurrence_type,
                                 installment_id, installment_number, total_installments)
            VALUES (14, 1, 'Desk (2/2)', '70.00', 'expense', '2026-03-04', 1, 'installment', 'g1', 2, 2);
        "#,
    )
    .unwrap();
    assert!(doctor::scan(&conn).unwrap().is_empty());
}
