// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use duoledger::{commands::reports, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO households(id, name) VALUES (1, 'Casa');
        INSERT INTO settings(key, value) VALUES ('active_household', '1');
        INSERT INTO accounts(id, household_id, name, type) VALUES (1, 1, 'Checking', 'bank');
        INSERT INTO cards(id, household_id, name) VALUES (1, 1, 'Violet');
        INSERT INTO categories(id, household_id, name) VALUES (1, 1, 'Home');
        INSERT INTO categories(id, household_id, name) VALUES (2, 1, 'Food');
        "#,
    )
    .unwrap();
    conn
}

#[test]
fn balances_net_income_minus_expense() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO transactions(household_id, description, amount, type, date, account_id)
            VALUES (1, 'Salary', '1000.00', 'income', '2026-03-01', 1);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id)
            VALUES (1, 'Rent', '250.00', 'expense', '2026-03-02', 1);
        INSERT INTO transactions(household_id, description, amount, type, date, card_id)
            VALUES (1, 'Dinner', '100.00', 'expense', '2026-03-03', 1);
        "#,
    )
    .unwrap();

    let rows = reports::balance_rows(&conn, 1).unwrap();
    assert_eq!(rows.len(), 2);
    let checking = rows.iter().find(|r| r.name == "Checking").unwrap();
    assert_eq!(checking.kind, "bank");
    assert_eq!(checking.balance, "750,00");
    let violet = rows.iter().find(|r| r.name == "Violet").unwrap();
    assert_eq!(violet.kind, "card");
    assert_eq!(violet.balance, "-100,00");
}

#[test]
fn empty_methods_show_zero_balance() {
    let conn = setup();
    let rows = reports::balance_rows(&conn, 1).unwrap();
    assert!(rows.iter().all(|r| r.balance == "0,00"));
}

#[test]
fn cashflow_skips_reimbursable_and_limits_window() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO transactions(household_id, description, amount, type, date, account_id)
            VALUES (1, 'Salary', '1000.00', 'income', '2026-01-05', 1);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id)
            VALUES (1, 'Groceries', '200.00', 'expense', '2026-01-10', 1);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id)
            VALUES (1, 'Salary', '1000.00', 'income', '2026-02-05', 1);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id)
            VALUES (1, 'Salary', '1000.00', 'income', '2026-03-05', 1);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id,
                                 is_third_party, third_party_name, third_party_status)
            VALUES (1, 'Fronted', '300.00', 'expense', '2026-03-06', 1, 1, 'Rui', 'pending');
        "#,
    )
    .unwrap();

    let rows = reports::cashflow_rows(&conn, 1, 2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].month, "2026-03");
    assert_eq!(rows[0].income, "1.000,00");
    // the fronted expense is not ours
    assert_eq!(rows[0].expense, "0,00");
    assert_eq!(rows[1].month, "2026-02");
}

#[test]
fn spend_by_category_sorts_desc_and_buckets_uncategorized() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO transactions(household_id, description, amount, type, date, account_id, category_id)
            VALUES (1, 'Sofa', '300.00', 'expense', '2026-03-01', 1, 1);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id, category_id)
            VALUES (1, 'Groceries', '100.00', 'expense', '2026-03-02', 1, 2);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id)
            VALUES (1, 'Stuff', '50.00', 'expense', '2026-03-03', 1);
        INSERT INTO transactions(household_id, description, amount, type, date, account_id, category_id)
            VALUES (1, 'Salary', '900.00', 'income', '2026-03-04', 1, 1);
        "#,
    )
    .unwrap();

    let rows = reports::spend_rows(&conn, 1, "2026-03").unwrap();
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.category.as_str(), r.spent.as_str()))
        .collect();
    assert_eq!(
        pairs,
        [
            ("Home", "300,00"),
            ("Food", "100,00"),
            ("(uncategorized)", "50,00"),
        ]
    );
}
