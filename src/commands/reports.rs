// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::utils::{active_household, fmt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balances", sub)) => balances(conn, sub)?,
        Some(("cashflow", sub)) => cashflow(conn, sub)?,
        Some(("spend-by-category", sub)) => spend_by_category(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct BalanceRow {
    pub name: String,
    pub kind: String,
    pub balance: String,
}

fn fold_balances(
    conn: &Connection,
    sql: &str,
    household_id: i64,
    fixed_kind: Option<&str>,
) -> Result<BTreeMap<String, (String, Decimal)>> {
    let mut map: BTreeMap<String, (String, Decimal)> = BTreeMap::new();
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![household_id])?;
    while let Some(r) = rows.next()? {
        let name: String = r.get(0)?;
        let kind: String = match fixed_kind {
            Some(k) => k.to_string(),
            None => r.get(1)?,
        };
        let amount: Option<String> = r.get(2)?;
        let tx_kind: Option<String> = r.get(3)?;
        let entry = map.entry(name.clone()).or_insert((kind, Decimal::ZERO));
        if let (Some(a), Some(k)) = (amount, tx_kind) {
            let amt = Decimal::from_str_exact(&a)
                .with_context(|| format!("Invalid amount '{}' on {}", a, name))?;
            match k.parse::<TxKind>()? {
                TxKind::Income => entry.1 += amt,
                TxKind::Expense => entry.1 -= amt,
            }
        }
    }
    Ok(map)
}

/// Net of everything ever booked against each account and card. Reimbursable
/// spend stays in: the money left the account either way.
pub fn balance_rows(conn: &Connection, household_id: i64) -> Result<Vec<BalanceRow>> {
    let accounts = fold_balances(
        conn,
        "SELECT a.name, a.type, t.amount, t.type FROM accounts a
         LEFT JOIN transactions t ON t.account_id=a.id
         WHERE a.household_id=?1",
        household_id,
        None,
    )?;
    let cards = fold_balances(
        conn,
        "SELECT k.name, '', t.amount, t.type FROM cards k
         LEFT JOIN transactions t ON t.card_id=k.id
         WHERE k.household_id=?1",
        household_id,
        Some("card"),
    )?;
    let mut data = Vec::new();
    for (name, (kind, bal)) in accounts.into_iter().chain(cards) {
        data.push(BalanceRow {
            name,
            kind,
            balance: fmt_money(&bal),
        });
    }
    Ok(data)
}

fn balances(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let data = balance_rows(conn, household_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| vec![r.name.clone(), r.kind.clone(), r.balance.clone()])
            .collect();
        println!("{}", pretty_table(&["Name", "Kind", "Balance"], rows));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct CashflowRow {
    pub month: String,
    pub income: String,
    pub expense: String,
}

/// Most recent `months` calendar months, newest first. Reimbursable spend
/// is excluded here so the flow reflects the household's own money.
pub fn cashflow_rows(
    conn: &Connection,
    household_id: i64,
    months: usize,
) -> Result<Vec<CashflowRow>> {
    let mut stmt = conn.prepare(
        "SELECT substr(date,1,7) AS month, amount, type
         FROM transactions
         WHERE household_id=?1 AND is_third_party=0
         ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(params![household_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;

    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for row in rows {
        let (m, amt_s, kind) = row?;
        let amt = Decimal::from_str_exact(&amt_s)
            .with_context(|| format!("Invalid amount '{}' in {}", amt_s, m))?;
        let entry = map.entry(m).or_insert((Decimal::ZERO, Decimal::ZERO));
        match kind.parse::<TxKind>()? {
            TxKind::Income => entry.0 += amt,
            TxKind::Expense => entry.1 += amt,
        }
    }
    Ok(map
        .iter()
        .rev()
        .take(months)
        .map(|(m, (inc, exp))| CashflowRow {
            month: m.clone(),
            income: fmt_money(inc),
            expense: fmt_money(exp),
        })
        .collect())
}

fn cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);
    let data = cashflow_rows(conn, household_id, months)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| vec![r.month.clone(), r.income.clone(), r.expense.clone()])
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expense"], rows));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct SpendRow {
    pub category: String,
    pub spent: String,
}

pub fn spend_rows(conn: &Connection, household_id: i64, month: &str) -> Result<Vec<SpendRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, t.amount FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.household_id=?1 AND substr(t.date,1,7)=?2
           AND t.type='expense' AND t.is_third_party=0",
    )?;
    let rows = stmt.query_map(params![household_id, month], |r| {
        Ok((r.get::<_, Option<String>>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut agg: HashMap<String, Decimal> = HashMap::new();
    for row in rows {
        let (cat_opt, amt_s) = row?;
        let cat = cat_opt.unwrap_or("(uncategorized)".into());
        let amt = Decimal::from_str_exact(&amt_s)
            .with_context(|| format!("Invalid amount '{}' for {}", amt_s, cat))?;
        *agg.entry(cat).or_insert(Decimal::ZERO) += amt;
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(items
        .into_iter()
        .map(|(category, amt)| SpendRow {
            category,
            spent: fmt_money(&amt),
        })
        .collect())
}

fn spend_by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let data = spend_rows(conn, household_id, &month)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| vec![r.category.clone(), r.spent.clone()])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], rows));
    }
    Ok(())
}
