// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{PayStatus, RecurrenceKind, TxKind};
use crate::utils::{
    active_household, active_user, fmt_money, id_for_account, id_for_card, id_for_category,
    id_for_tag, id_for_user, maybe_print_json, parse_date, parse_money_input, parse_month,
    pretty_table,
};
use anyhow::{bail, Context, Result};
use chrono::{Months, NaiveDate};
use rusqlite::{params, Connection};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Installment {
    pub group_id: String,
    pub number: u32,
    pub total: u32,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
}

pub const MAX_INSTALLMENTS: u32 = 360;

/// Split `total` into `count` monthly parts starting at `start`.
///
/// Every part except the last carries the half-up rounded share; the last
/// absorbs the leftover cents so the parts always sum to `total` exactly.
/// Splits that would leave any part at or below zero are rejected, as are
/// counts beyond [`MAX_INSTALLMENTS`]. Dates advance one calendar month per
/// part, clamped to shorter months.
pub fn expand_installments(
    description: &str,
    total: Decimal,
    count: u32,
    start: NaiveDate,
    group_id: &str,
) -> Result<Vec<Installment>> {
    if count < 2 {
        bail!("Installments require at least 2 parts, got {}", count);
    }
    if count > MAX_INSTALLMENTS {
        bail!(
            "Installments are capped at {} parts, got {}",
            MAX_INSTALLMENTS,
            count
        );
    }
    let share = (total / Decimal::from(count))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let last = total - share * Decimal::from(count - 1);
    if share <= Decimal::ZERO || last <= Decimal::ZERO {
        bail!("Amount too small to split into {} installments", count);
    }

    let mut parts = Vec::with_capacity(count as usize);
    for i in 0..count {
        let number = i + 1;
        let date = start
            .checked_add_months(Months::new(i))
            .with_context(|| format!("Installment date out of range: {} +{} months", start, i))?;
        parts.push(Installment {
            group_id: group_id.to_string(),
            number,
            total: count,
            date,
            description: format!("{} ({}/{})", description, number, count),
            amount: if number == count { last } else { share },
        });
    }
    Ok(parts)
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
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
    let kind: TxKind = sub.get_one::<String>("type").unwrap().parse()?;

    let (account_id, card_id) = match (
        sub.get_one::<String>("account"),
        sub.get_one::<String>("card"),
    ) {
        (Some(_), Some(_)) => bail!("Use either --account or --card, not both"),
        (Some(a), None) => (Some(id_for_account(conn, household_id, a)?), None),
        (None, Some(k)) => (None, Some(id_for_card(conn, household_id, k)?)),
        (None, None) => bail!("A payment method is required: --account or --card"),
    };

    let monthly = sub.get_flag("monthly");
    let installments = sub.get_one::<u32>("installments").copied();
    if monthly && installments.is_some() {
        bail!("Use either --installments or --monthly, not both");
    }
    if installments.is_some() && kind != TxKind::Expense {
        bail!("Only expenses can be split into installments");
    }

    let third_party = sub
        .get_one::<String>("third_party")
        .map(|s| s.trim().to_string());
    if let Some(name) = &third_party {
        if name.is_empty() {
            bail!("Third-party name must not be empty");
        }
        if kind != TxKind::Expense {
            bail!("Only expenses can be marked third-party");
        }
    }

    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(conn, household_id, c)?),
        None => None,
    };
    let mut tag_ids = Vec::new();
    if let Some(tags) = sub.get_one::<String>("tags") {
        for name in tags.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            tag_ids.push(id_for_tag(conn, household_id, name)?);
        }
    }
    let user_id = active_user(conn)?;

    let tx = conn.transaction()?;
    if let Some(count) = installments {
        let group = Uuid::new_v4().to_string();
        let parts = expand_installments(&description, amount, count, date, &group)?;
        for part in &parts {
            tx.execute(
                "INSERT INTO transactions(household_id, user_id, description, amount, type, date,
                     category_id, account_id, card_id, is_recurring, recurrence_type,
                     installment_id, installment_number, total_installments,
                     is_third_party, third_party_name, third_party_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    household_id,
                    user_id,
                    part.description,
                    part.amount.to_string(),
                    kind.as_str(),
                    part.date.to_string(),
                    category_id,
                    account_id,
                    card_id,
                    RecurrenceKind::Installment.as_str(),
                    part.group_id,
                    part.number,
                    part.total,
                    third_party.is_some() as i64,
                    third_party.as_deref(),
                    third_party.as_ref().map(|_| PayStatus::Pending.as_str()),
                ],
            )?;
            let txn_id = tx.last_insert_rowid();
            for tag_id in &tag_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO transaction_tags(transaction_id, tag_id) VALUES (?1, ?2)",
                    params![txn_id, tag_id],
                )?;
            }
        }
        tx.commit()?;
        println!(
            "Recorded '{}' in {} monthly installments totalling {}",
            description,
            count,
            fmt_money(&amount)
        );
    } else {
        let recurrence = if monthly {
            RecurrenceKind::Monthly
        } else {
            RecurrenceKind::None
        };
        tx.execute(
            "INSERT INTO transactions(household_id, user_id, description, amount, type, date,
                 category_id, account_id, card_id, is_recurring, recurrence_type,
                 is_third_party, third_party_name, third_party_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                household_id,
                user_id,
                description,
                amount.to_string(),
                kind.as_str(),
                date.to_string(),
                category_id,
                account_id,
                card_id,
                monthly as i64,
                recurrence.as_str(),
                third_party.is_some() as i64,
                third_party.as_deref(),
                third_party.as_ref().map(|_| PayStatus::Pending.as_str()),
            ],
        )?;
        let txn_id = tx.last_insert_rowid();
        for tag_id in &tag_ids {
            tx.execute(
                "INSERT OR IGNORE INTO transaction_tags(transaction_id, tag_id) VALUES (?1, ?2)",
                params![txn_id, tag_id],
            )?;
        }
        tx.commit()?;
        println!(
            "Recorded {} '{}' of {} on {}",
            kind.as_str(),
            description,
            fmt_money(&amount),
            date
        );
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.method.clone(),
                    r.user.clone(),
                    r.third_party.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID",
                    "Date",
                    "Description",
                    "Amount",
                    "Type",
                    "Category",
                    "Method",
                    "By",
                    "3rd party"
                ],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub kind: String,
    pub category: String,
    pub method: String,
    pub user: String,
    pub third_party: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let household_id = active_household(conn)?;
    let mut sql = String::from(
        "SELECT t.id, t.date, t.description, t.amount, t.type, COALESCE(c.name,''), \
         COALESCE(a.name, k.name, ''), COALESCE(u.name,''), t.is_third_party, \
         COALESCE(t.third_party_name,''), COALESCE(t.third_party_status,'pending') \
         FROM transactions t \
         LEFT JOIN categories c ON t.category_id=c.id \
         LEFT JOIN accounts a ON t.account_id=a.id \
         LEFT JOIN cards k ON t.card_id=k.id \
         LEFT JOIN users u ON t.user_id=u.id \
         WHERE t.household_id=?",
    );
    let mut params_vec: Vec<String> = vec![household_id.to_string()];

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(parse_month(month)?);
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.name=?");
        params_vec.push(acct.into());
    }
    if let Some(card) = sub.get_one::<String>("card") {
        sql.push_str(" AND k.name=?");
        params_vec.push(card.into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat.into());
    }
    if let Some(user) = sub.get_one::<String>("user") {
        // Resolve the name so a typo errors instead of matching nothing
        id_for_user(conn, household_id, user)?;
        sql.push_str(" AND u.name=?");
        params_vec.push(user.into());
    }
    if sub.get_flag("third_party") {
        sql.push_str(" AND t.is_third_party=1");
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let amount_raw: String = r.get(3)?;
        let amount = Decimal::from_str_exact(&amount_raw)
            .map(|d| fmt_money(&d))
            .unwrap_or(amount_raw);
        let is_third_party: i64 = r.get(8)?;
        let third_party = if is_third_party != 0 {
            format!("{} ({})", r.get::<_, String>(9)?, r.get::<_, String>(10)?)
        } else {
            String::new()
        };
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            description: r.get(2)?,
            amount,
            kind: r.get(4)?,
            category: r.get(5)?,
            method: r.get(6)?,
            user: r.get(7)?,
            third_party,
        });
    }
    Ok(data)
}
