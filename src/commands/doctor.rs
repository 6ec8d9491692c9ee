// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

/// Sweep the ledger for rows the normal command paths should never produce.
pub fn scan(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Paid occurrences must link the transaction that paid them
    let mut stmt = conn.prepare(
        "SELECT id FROM fixed_expense_occurrences
         WHERE status='paid' AND (transaction_id IS NULL OR paid_at IS NULL)",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec![
            "paid_occurrence_unlinked".into(),
            format!("occurrence {}", id),
        ]);
    }

    // 2) Settled reimbursements carry a timestamp
    let mut stmt2 = conn.prepare(
        "SELECT id FROM transactions
         WHERE is_third_party=1 AND third_party_status='paid' AND third_party_paid_at IS NULL",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec![
            "third_party_paid_no_timestamp".into(),
            format!("transaction {}", id),
        ]);
    }

    // 3) Reimbursable expenses name who owes them
    let mut stmt3 = conn.prepare(
        "SELECT id FROM transactions
         WHERE is_third_party=1 AND (third_party_name IS NULL OR third_party_name='')",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec![
            "third_party_missing_name".into(),
            format!("transaction {}", id),
        ]);
    }

    // 4) Installment rows carry their group token
    let mut stmt4 = conn.prepare(
        "SELECT id FROM transactions
         WHERE recurrence_type='installment'
           AND (installment_id IS NULL OR installment_number IS NULL OR total_installments IS NULL)",
    )?;
    let mut cur4 = stmt4.query([])?;
    while let Some(r) = cur4.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec![
            "installment_missing_group".into(),
            format!("transaction {}", id),
        ]);
    }

    // 5) An installment group holds exactly its advertised parts
    let mut stmt5 = conn.prepare(
        "SELECT installment_id FROM transactions
         WHERE installment_id IS NOT NULL
         GROUP BY installment_id
         HAVING COUNT(DISTINCT installment_number) <> MAX(total_installments)",
    )?;
    let mut cur5 = stmt5.query([])?;
    while let Some(r) = cur5.next()? {
        let group: String = r.get(0)?;
        rows.push(vec!["installment_gap".into(), format!("group {}", group)]);
    }

    // 6) Deactivated templates should not keep pending occurrences
    let mut stmt6 = conn.prepare(
        "SELECT o.id FROM fixed_expense_occurrences o
         JOIN fixed_expenses f ON o.fixed_expense_id=f.id
         WHERE o.status='pending' AND f.is_active=0",
    )?;
    let mut cur6 = stmt6.query([])?;
    while let Some(r) = cur6.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec![
            "pending_inactive_template".into(),
            format!("occurrence {}", id),
        ]);
    }

    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = scan(conn)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
