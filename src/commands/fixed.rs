// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{FixedExpense, PayStatus, RecurrenceKind, TxKind};
use crate::utils::{
    active_household, active_user, due_date_value, fmt_money, id_for_account, id_for_card,
    id_for_category, maybe_print_json, parse_money_input, parse_month, pretty_table, split_month,
};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("due", sub)) => due(conn, sub)?,
        Some(("pay", sub)) => {
            let household_id = active_household(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            let user_id = active_user(conn)?;
            let txn_id = pay_occurrence(conn, household_id, id, user_id)?;
            println!("Occurrence {} paid, recorded as transaction {}", id, txn_id);
        }
        _ => {}
    }
    Ok(())
}

pub fn active_templates(conn: &Connection, household_id: i64) -> Result<Vec<FixedExpense>> {
    let mut stmt = conn.prepare(
        "SELECT id, household_id, description, amount, due_day, category_id, account_id, card_id, is_active
         FROM fixed_expenses WHERE household_id=?1 AND is_active=1 ORDER BY due_day, description",
    )?;
    let rows = stmt.query_map(params![household_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, u32>(4)?,
            r.get::<_, Option<i64>>(5)?,
            r.get::<_, Option<i64>>(6)?,
            r.get::<_, Option<i64>>(7)?,
            r.get::<_, i64>(8)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, household_id, description, amount, due_day, category_id, account_id, card_id, active) =
            row?;
        out.push(FixedExpense {
            id,
            household_id,
            description,
            amount: Decimal::from_str_exact(&amount)
                .with_context(|| format!("Corrupt amount '{}' on fixed expense {}", amount, id))?,
            due_day,
            category_id,
            account_id,
            card_id,
            is_active: active != 0,
        });
    }
    Ok(out)
}

fn template_by_id(conn: &Connection, household_id: i64, id: i64) -> Result<FixedExpense> {
    let row = conn
        .query_row(
            "SELECT id, household_id, description, amount, due_day, category_id, account_id, card_id, is_active
             FROM fixed_expenses WHERE id=?1 AND household_id=?2",
            params![id, household_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, u32>(4)?,
                    r.get::<_, Option<i64>>(5)?,
                    r.get::<_, Option<i64>>(6)?,
                    r.get::<_, Option<i64>>(7)?,
                    r.get::<_, i64>(8)?,
                ))
            },
        )
        .optional()?
        .with_context(|| format!("Fixed expense {} not found", id))?;
    let (id, household_id, description, amount, due_day, category_id, account_id, card_id, active) =
        row;
    Ok(FixedExpense {
        id,
        household_id,
        description,
        amount: Decimal::from_str_exact(&amount)
            .with_context(|| format!("Corrupt amount '{}' on fixed expense {}", amount, id))?,
        due_day,
        category_id,
        account_id,
        card_id,
        is_active: active != 0,
    })
}

/// Create any missing pending occurrences for the month. Safe to call
/// repeatedly: existing rows, paid or pending, are left untouched.
pub fn ensure_occurrences(
    conn: &Connection,
    household_id: i64,
    year: i32,
    month: u32,
) -> Result<usize> {
    let mut created = 0;
    for tpl in active_templates(conn, household_id)? {
        let due = due_date_value(year, month, tpl.due_day)?;
        created += conn.execute(
            "INSERT INTO fixed_expense_occurrences(fixed_expense_id, household_id, month, year, due_date, amount, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending')
             ON CONFLICT(fixed_expense_id, month, year) DO NOTHING",
            params![
                tpl.id,
                household_id,
                month,
                year,
                due.to_string(),
                tpl.amount.to_string()
            ],
        )?;
    }
    Ok(created)
}

/// Pay a pending occurrence: record the expense transaction and flip the
/// occurrence to paid in one unit. Paying twice fails and writes nothing.
pub fn pay_occurrence(
    conn: &mut Connection,
    household_id: i64,
    occurrence_id: i64,
    user_id: Option<i64>,
) -> Result<i64> {
    let row = conn
        .query_row(
            "SELECT o.due_date, o.amount, o.status, f.description, f.category_id, f.account_id, f.card_id
             FROM fixed_expense_occurrences o
             JOIN fixed_expenses f ON o.fixed_expense_id=f.id
             WHERE o.id=?1 AND o.household_id=?2",
            params![occurrence_id, household_id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    r.get::<_, Option<i64>>(5)?,
                    r.get::<_, Option<i64>>(6)?,
                ))
            },
        )
        .optional()?
        .with_context(|| format!("Occurrence {} not found", occurrence_id))?;
    let (due_date, amount, status, description, category_id, account_id, card_id) = row;
    if status.parse::<PayStatus>()? == PayStatus::Paid {
        bail!("Occurrence {} is already paid", occurrence_id);
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO transactions(household_id, user_id, description, amount, type, date,
             category_id, account_id, card_id, is_recurring, recurrence_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)",
        params![
            household_id,
            user_id,
            description,
            amount,
            TxKind::Expense.as_str(),
            due_date,
            category_id,
            account_id,
            card_id,
            RecurrenceKind::Monthly.as_str(),
        ],
    )?;
    let txn_id = tx.last_insert_rowid();
    // Guarded so a concurrent pay cannot link two transactions
    let updated = tx.execute(
        "UPDATE fixed_expense_occurrences
         SET status='paid', paid_at=datetime('now'), transaction_id=?1
         WHERE id=?2 AND status='pending'",
        params![txn_id, occurrence_id],
    )?;
    if updated == 0 {
        bail!("Occurrence {} is already paid", occurrence_id);
    }
    tx.commit()?;
    Ok(txn_id)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let description = sub
        .get_one::<String>("description")
        .unwrap()
        .trim()
        .to_string();
    if description.is_empty() {
        bail!("Description must not be empty");
    }
    let amount = parse_money_input(sub.get_one::<String>("amount").unwrap())?;
    if amount <= Decimal::ZERO {
        bail!("Amount must be positive");
    }
    let due_day = *sub.get_one::<u32>("due_day").unwrap();
    if !(1..=31).contains(&due_day) {
        bail!("Due day must be between 1 and 31, got {}", due_day);
    }
    let (account_id, card_id) = match (
        sub.get_one::<String>("account"),
        sub.get_one::<String>("card"),
    ) {
        (Some(_), Some(_)) => bail!("Use either --account or --card, not both"),
        (Some(a), None) => (Some(id_for_account(conn, household_id, a)?), None),
        (None, Some(k)) => (None, Some(id_for_card(conn, household_id, k)?)),
        (None, None) => bail!("A payment method is required: --account or --card"),
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(conn, household_id, c)?),
        None => None,
    };
    conn.execute(
        "INSERT INTO fixed_expenses(household_id, description, amount, due_day, category_id, account_id, card_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            household_id,
            description,
            amount.to_string(),
            due_day,
            category_id,
            account_id,
            card_id
        ],
    )?;
    println!(
        "Added fixed expense '{}' of {} due on day {}",
        description,
        fmt_money(&amount),
        due_day
    );
    Ok(())
}

#[derive(Serialize)]
struct TemplateRow {
    id: i64,
    description: String,
    amount: String,
    due_day: u32,
    category: String,
    method: String,
    active: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let mut stmt = conn.prepare(
        "SELECT f.id, f.description, f.amount, f.due_day, COALESCE(c.name,''), \
         COALESCE(a.name, k.name, ''), f.is_active \
         FROM fixed_expenses f \
         LEFT JOIN categories c ON f.category_id=c.id \
         LEFT JOIN accounts a ON f.account_id=a.id \
         LEFT JOIN cards k ON f.card_id=k.id \
         WHERE f.household_id=?1 ORDER BY f.due_day, f.description",
    )?;
    let rows = stmt.query_map(params![household_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, u32>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, i64>(6)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, description, amount, due_day, category, method, active) = row?;
        let amount = Decimal::from_str_exact(&amount)
            .map(|d| fmt_money(&d))
            .unwrap_or(amount);
        data.push(TemplateRow {
            id,
            description,
            amount,
            due_day,
            category,
            method,
            active: active != 0,
        });
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.due_day.to_string(),
                    r.category.clone(),
                    r.method.clone(),
                    if r.active { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Description", "Amount", "Due day", "Category", "Method", "Active"],
                rows,
            )
        );
    }
    Ok(())
}

fn edit(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let tpl = template_by_id(conn, household_id, id)?;

    let description = match sub.get_one::<String>("description") {
        Some(d) => {
            let d = d.trim().to_string();
            if d.is_empty() {
                bail!("Description must not be empty");
            }
            d
        }
        None => tpl.description,
    };
    let amount = match sub.get_one::<String>("amount") {
        Some(a) => {
            let a = parse_money_input(a)?;
            if a <= Decimal::ZERO {
                bail!("Amount must be positive");
            }
            a
        }
        None => tpl.amount,
    };
    let due_day = match sub.get_one::<u32>("due_day") {
        Some(&d) => {
            if !(1..=31).contains(&d) {
                bail!("Due day must be between 1 and 31, got {}", d);
            }
            d
        }
        None => tpl.due_day,
    };
    let activate = sub.get_flag("activate");
    let deactivate = sub.get_flag("deactivate");
    if activate && deactivate {
        bail!("Use either --activate or --deactivate, not both");
    }
    let is_active = if activate {
        true
    } else if deactivate {
        false
    } else {
        tpl.is_active
    };

    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE fixed_expenses SET description=?1, amount=?2, due_day=?3, is_active=?4 WHERE id=?5",
        params![description, amount.to_string(), due_day, is_active as i64, id],
    )?;
    if !is_active {
        // A deactivated template stops billing; its unpaid occurrences go too
        let cancelled = tx.execute(
            "DELETE FROM fixed_expense_occurrences WHERE fixed_expense_id=?1 AND status='pending'",
            params![id],
        )?;
        tx.commit()?;
        println!(
            "Updated fixed expense {} ({} pending occurrence(s) cancelled)",
            id, cancelled
        );
        return Ok(());
    }
    // Pending occurrences track the template; paid ones are history
    let pending: Vec<(i64, i32, u32)> = {
        let mut stmt = tx.prepare(
            "SELECT id, year, month FROM fixed_expense_occurrences
             WHERE fixed_expense_id=?1 AND status='pending'",
        )?;
        let rows = stmt.query_map(params![id], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    let mut refreshed = 0;
    for (occ_id, year, month) in pending {
        let due = due_date_value(year, month, due_day)?;
        refreshed += tx.execute(
            "UPDATE fixed_expense_occurrences SET amount=?1, due_date=?2 WHERE id=?3 AND status='pending'",
            params![amount.to_string(), due.to_string(), occ_id],
        )?;
    }
    tx.commit()?;
    println!(
        "Updated fixed expense {} ({} pending occurrence(s) refreshed)",
        id, refreshed
    );
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let n = conn.execute(
        "DELETE FROM fixed_expenses WHERE id=?1 AND household_id=?2",
        params![id, household_id],
    )?;
    if n == 0 {
        bail!("Fixed expense {} not found", id);
    }
    println!("Removed fixed expense {} and its occurrences", id);
    Ok(())
}

#[derive(Serialize)]
pub struct OccurrenceRow {
    pub id: i64,
    pub due_date: String,
    pub description: String,
    pub amount: String,
    pub status: String,
    pub paid_at: Option<String>,
}

pub fn occurrence_rows(
    conn: &Connection,
    household_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<OccurrenceRow>> {
    let mut stmt = conn.prepare(
        "SELECT o.id, o.due_date, f.description, o.amount, o.status, o.paid_at
         FROM fixed_expense_occurrences o
         JOIN fixed_expenses f ON o.fixed_expense_id=f.id
         WHERE o.household_id=?1 AND o.year=?2 AND o.month=?3
         ORDER BY o.due_date, f.description",
    )?;
    let rows = stmt.query_map(params![household_id, year, month], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, due_date, description, amount, status, paid_at) = row?;
        let amount = Decimal::from_str_exact(&amount)
            .map(|d| fmt_money(&d))
            .unwrap_or(amount);
        data.push(OccurrenceRow {
            id,
            due_date,
            description,
            amount,
            status,
            paid_at,
        });
    }
    Ok(data)
}

fn due(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let month_str = parse_month(sub.get_one::<String>("month").unwrap())?;
    let (year, month) = split_month(&month_str)?;
    let created = ensure_occurrences(conn, household_id, year, month)?;
    if created > 0 {
        println!("Materialized {} new occurrence(s) for {}", created, month_str);
    }
    let data = occurrence_rows(conn, household_id, year, month)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.due_date.clone(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.status.clone(),
                    r.paid_at.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Due", "Description", "Amount", "Status", "Paid at"],
                rows,
            )
        );
    }
    Ok(())
}
