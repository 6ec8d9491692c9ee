// Copyright (c) 2025 AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::PayStatus;
use crate::utils::{active_household, fmt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("status", sub)) => status(conn, sub)?,
        Some(("pay", sub)) => {
            let household_id = active_household(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            mark_paid(conn, household_id, id)?;
            println!("Marked transaction {} as settled", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct ThirdPartyRow {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub third_party_name: String,
    pub method: String,
    pub amount: Decimal,
    pub status: PayStatus,
    pub paid_at: Option<String>,
}

/// Expenses fronted for someone outside the household, one calendar month
/// at a time. Rows predating the status column count as pending.
pub fn rows_for_period(
    conn: &Connection,
    household_id: i64,
    month: &str,
) -> Result<Vec<ThirdPartyRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.date, t.description, COALESCE(t.third_party_name,''), \
         COALESCE(a.name, k.name, ''), t.amount, \
         COALESCE(t.third_party_status,'pending'), t.third_party_paid_at \
         FROM transactions t \
         LEFT JOIN accounts a ON t.account_id=a.id \
         LEFT JOIN cards k ON t.card_id=k.id \
         WHERE t.household_id=?1 AND t.type='expense' AND t.is_third_party=1 \
           AND substr(t.date,1,7)=?2 \
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map(params![household_id, month], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, Option<String>>(7)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, date, description, third_party_name, method, amount, status, paid_at) = row?;
        data.push(ThirdPartyRow {
            id,
            date,
            description,
            third_party_name,
            method,
            amount: Decimal::from_str_exact(&amount)?,
            status: status.parse()?,
            paid_at,
        });
    }
    Ok(data)
}

/// Narrow the month's rows by case-insensitive text search and status.
/// Filters affect what is listed, never the month totals.
pub fn visible_rows<'a>(
    rows: &'a [ThirdPartyRow],
    search: Option<&str>,
    status: Option<PayStatus>,
) -> Vec<&'a ThirdPartyRow> {
    let needle = search.map(|s| s.to_lowercase());
    rows.iter()
        .filter(|r| match &needle {
            Some(n) => {
                r.description.to_lowercase().contains(n)
                    || r.third_party_name.to_lowercase().contains(n)
                    || r.method.to_lowercase().contains(n)
            }
            None => true,
        })
        .filter(|r| match status {
            Some(s) => r.status == s,
            None => true,
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ThirdPartySummary {
    pub total_count: usize,
    pub total_amount: Decimal,
    pub pending_count: usize,
    pub pending_amount: Decimal,
    pub paid_count: usize,
    pub paid_amount: Decimal,
    pub visible_count: usize,
    pub visible_amount: Decimal,
}

pub fn summarize(rows: &[ThirdPartyRow], visible: &[&ThirdPartyRow]) -> ThirdPartySummary {
    let mut s = ThirdPartySummary {
        total_count: rows.len(),
        total_amount: Decimal::ZERO,
        pending_count: 0,
        pending_amount: Decimal::ZERO,
        paid_count: 0,
        paid_amount: Decimal::ZERO,
        visible_count: visible.len(),
        visible_amount: Decimal::ZERO,
    };
    for r in rows {
        s.total_amount += r.amount;
        match r.status {
            PayStatus::Pending => {
                s.pending_count += 1;
                s.pending_amount += r.amount;
            }
            PayStatus::Paid => {
                s.paid_count += 1;
                s.paid_amount += r.amount;
            }
        }
    }
    for r in visible {
        s.visible_amount += r.amount;
    }
    s
}

/// Settle one reimbursable expense. This only stamps the row; the original
/// transaction already carries the spend, so no new row is written.
pub fn mark_paid(conn: &Connection, household_id: i64, txn_id: i64) -> Result<()> {
    let n = conn.execute(
        "UPDATE transactions
         SET third_party_status='paid', third_party_paid_at=datetime('now')
         WHERE id=?1 AND household_id=?2 AND is_third_party=1
           AND COALESCE(third_party_status,'pending')='pending'",
        params![txn_id, household_id],
    )?;
    if n == 0 {
        bail!(
            "Transaction {} is not a pending third-party expense",
            txn_id
        );
    }
    Ok(())
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let search = sub.get_one::<String>("search").map(|s| s.as_str());
    let wanted = match sub.get_one::<String>("status") {
        Some(s) => Some(s.parse::<PayStatus>()?),
        None => None,
    };

    let rows = rows_for_period(conn, household_id, &month)?;
    let visible = visible_rows(&rows, search, wanted);
    let summary = summarize(&rows, &visible);

    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    if json_flag || jsonl_flag {
        let payload = serde_json::json!({ "rows": visible, "summary": summary });
        maybe_print_json(json_flag, jsonl_flag, &payload)?;
        return Ok(());
    }

    let table: Vec<Vec<String>> = visible
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.date.clone(),
                r.description.clone(),
                r.third_party_name.clone(),
                r.method.clone(),
                fmt_money(&r.amount),
                r.status.as_str().to_string(),
                r.paid_at.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Description", "Who", "Method", "Amount", "Status", "Paid at"],
            table,
        )
    );
    if search.is_some() || wanted.is_some() {
        println!(
            "Showing {} of {} item(s), {}",
            summary.visible_count,
            summary.total_count,
            fmt_money(&summary.visible_amount)
        );
    }
    println!(
        "Pending {} ({}) | Paid {} ({}) | Total {} ({})",
        summary.pending_count,
        fmt_money(&summary.pending_amount),
        summary.paid_count,
        fmt_money(&summary.paid_amount),
        summary.total_count,
        fmt_money(&summary.total_amount)
    );
    Ok(())
}
