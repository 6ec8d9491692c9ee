// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    active_household, fmt_money, id_for_category, maybe_print_json, parse_money_input, parse_month,
    pretty_table,
};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("report", sub)) => report(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let cat = sub.get_one::<String>("category").unwrap();
    let amount = parse_money_input(sub.get_one::<String>("amount").unwrap())?;
    if amount <= Decimal::ZERO {
        bail!("Amount must be positive");
    }
    let cat_id = id_for_category(conn, household_id, cat)?;
    conn.execute(
        "INSERT INTO budgets(household_id, month, category_id, amount) VALUES (?1,?2,?3,?4)
         ON CONFLICT(household_id, month, category_id) DO UPDATE SET amount=excluded.amount",
        params![household_id, month, cat_id, amount.to_string()],
    )?;
    println!("Budget set for {} / {} = {}", month, cat, fmt_money(&amount));
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let mut sql = String::from(
        "SELECT b.month, c.name, b.amount FROM budgets b \
         JOIN categories c ON b.category_id=c.id WHERE b.household_id=?1",
    );
    let month = match sub.get_one::<String>("month") {
        Some(m) => Some(parse_month(m)?),
        None => None,
    };
    if month.is_some() {
        sql.push_str(" AND b.month=?2 ORDER BY c.name");
    } else {
        sql.push_str(" ORDER BY b.month DESC, c.name");
    }
    let mut stmt = conn.prepare(&sql)?;
    let map_row = |r: &rusqlite::Row<'_>| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    };
    let rows = match &month {
        Some(m) => stmt.query_map(params![household_id, m], map_row)?,
        None => stmt.query_map(params![household_id], map_row)?,
    };
    let mut data = Vec::new();
    for row in rows {
        let (m, c, a) = row?;
        let shown = Decimal::from_str_exact(&a).map(|d| fmt_money(&d)).unwrap_or(a);
        data.push(vec![m, c, shown]);
    }
    println!("{}", pretty_table(&["Month", "Category", "Budget"], data));
    Ok(())
}

#[derive(Serialize)]
pub struct BudgetLine {
    pub category: String,
    pub budget: String,
    pub spent: String,
    pub remaining: String,
}

pub fn report_lines(conn: &Connection, household_id: i64, month: &str) -> Result<Vec<BudgetLine>> {
    let mut cats_stmt =
        conn.prepare("SELECT id, name FROM categories WHERE household_id=?1 ORDER BY name")?;
    let cats = cats_stmt.query_map(params![household_id], |r| {
        Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut data = Vec::new();
    for c in cats {
        let (cid, cname) = c?;
        let budget_s: Option<String> = conn
            .query_row(
                "SELECT amount FROM budgets WHERE household_id=?1 AND category_id=?2 AND month=?3",
                params![household_id, cid, month],
                |r| r.get(0),
            )
            .optional()?;
        let budget = match budget_s {
            Some(s) => Decimal::from_str_exact(&s)
                .with_context(|| format!("Corrupt budget amount '{}'", s))?,
            None => Decimal::ZERO,
        };

        // Reimbursable expenses are someone else's spend, not ours
        let mut tstmt = conn.prepare(
            "SELECT amount FROM transactions
             WHERE household_id=?1 AND category_id=?2 AND type='expense'
               AND is_third_party=0 AND substr(date,1,7)=?3",
        )?;
        let mut trs = tstmt.query(params![household_id, cid, month])?;
        let mut spent = Decimal::ZERO;
        while let Some(r) = trs.next()? {
            let amt_s: String = r.get(0)?;
            spent += Decimal::from_str_exact(&amt_s)
                .with_context(|| format!("Invalid amount '{}' in transactions", amt_s))?;
        }
        data.push(BudgetLine {
            category: cname,
            budget: fmt_money(&budget),
            spent: fmt_money(&spent),
            remaining: fmt_money(&(budget - spent)),
        });
    }
    Ok(data)
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let data = report_lines(conn, household_id, &month)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|l| {
                vec![
                    l.category.clone(),
                    l.budget.clone(),
                    l.spent.clone(),
                    l.remaining.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Budget", "Spent", "Remaining"], rows)
        );
    }
    Ok(())
}
