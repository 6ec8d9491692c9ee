// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use duoledger::{
    cli,
    commands::{households, transactions, users},
    db, utils,
};
use rusqlite::Connection;

fn fresh() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn dispatch(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    match matches.subcommand() {
        Some(("household", sub)) => households::handle(conn, sub),
        Some(("user", sub)) => users::handle(conn, sub),
        Some(("tx", sub)) => transactions::handle(conn, sub),
        _ => panic!("unexpected subcommand"),
    }
}

#[test]
fn first_household_becomes_active() {
    let mut conn = fresh();
    dispatch(&mut conn, &["duoledger", "household", "add", "--name", "Casa"]).unwrap();
    assert_eq!(utils::active_household_opt(&conn).unwrap(), Some(1));

    dispatch(&mut conn, &["duoledger", "household", "add", "--name", "Beach"]).unwrap();
    assert_eq!(utils::active_household_opt(&conn).unwrap(), Some(1));
}

#[test]
fn switching_household_clears_active_user() {
    let mut conn = fresh();
    dispatch(&mut conn, &["duoledger", "household", "add", "--name", "Casa"]).unwrap();
    dispatch(&mut conn, &["duoledger", "user", "add", "--name", "Ana"]).unwrap();
    dispatch(&mut conn, &["duoledger", "user", "use", "--name", "Ana"]).unwrap();
    assert!(utils::active_user(&conn).unwrap().is_some());

    dispatch(&mut conn, &["duoledger", "household", "add", "--name", "Beach"]).unwrap();
    dispatch(&mut conn, &["duoledger", "household", "use", "--name", "Beach"]).unwrap();
    assert_eq!(utils::active_household_opt(&conn).unwrap(), Some(2));
    assert!(utils::active_user(&conn).unwrap().is_none());
}

#[test]
fn active_user_stamps_new_transactions() {
    let mut conn = fresh();
    dispatch(&mut conn, &["duoledger", "household", "add", "--name", "Casa"]).unwrap();
    dispatch(&mut conn, &["duoledger", "user", "add", "--name", "Ana"]).unwrap();
    dispatch(&mut conn, &["duoledger", "user", "use", "--name", "Ana"]).unwrap();
    conn.execute(
        "INSERT INTO accounts(id, household_id, name, type) VALUES (1, 1, 'Checking', 'bank')",
        [],
    )
    .unwrap();

    dispatch(
        &mut conn,
        &[
            "duoledger", "tx", "add", "--date", "2026-03-01", "--description", "Dinner",
            "--amount", "25,00", "--account", "Checking",
        ],
    )
    .unwrap();
    let user_id: i64 = conn
        .query_row("SELECT user_id FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(user_id, 1);
}

#[test]
fn commands_require_active_household() {
    let mut conn = fresh();
    let err = dispatch(&mut conn, &["duoledger", "user", "list"]).unwrap_err();
    assert!(err.to_string().contains("No active household"));
}
