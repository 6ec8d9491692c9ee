// Copyright (c) 2025 AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::{Decimal, RoundingStrategy};

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Validates a `YYYY-MM` month and returns it zero-padded, so callers can
/// compare it against the `substr(date,1,7)` prefix of stored ISO dates.
pub fn parse_month(s: &str) -> Result<String> {
    let d = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(d.format("%Y-%m").to_string())
}

pub fn split_month(s: &str) -> Result<(i32, u32)> {
    let d = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok((d.year(), d.month()))
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<u32> {
    let last = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => return Err(anyhow::anyhow!("Invalid month number {}", month)),
    };
    Ok(last)
}

/// Due day clamped to the target month: day 31 in February lands on Feb 28/29,
/// never in March.
pub fn due_date_value(year: i32, month: u32, due_day: u32) -> Result<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    let day = due_day.min(last);
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow::anyhow!("Invalid due date {:04}-{:02}-{:02}", year, month, day))
}

fn group_thousands(units: &str) -> String {
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Renders a digits-only string as money, treating the integer value as cents:
/// "150050" becomes "1.500,50". Non-digits are stripped and no digits yields
/// "0,00"; more digits than a money value can hold is an error.
pub fn format_money_input(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok("0,00".to_string());
    }
    let cents: u128 = digits
        .parse()
        .with_context(|| format!("Amount '{}' is too large", raw))?;
    let units = (cents / 100).to_string();
    Ok(format!("{},{:02}", group_thousands(&units), cents % 100))
}

/// Inverse of [`format_money_input`]: strips "." thousands separators, turns
/// the decimal comma into a point, and parses the result as a decimal.
pub fn parse_money_input(display: &str) -> Result<Decimal> {
    let normalized = display.trim().replace('.', "").replace(',', ".");
    normalized
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount '{}', expected a value like 1.234,56", display))
}

pub fn fmt_money(d: &Decimal) -> String {
    let r = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let neg = r.is_sign_negative() && !r.is_zero();
    let s = r.abs().to_string();
    let (units, frac) = match s.split_once('.') {
        Some((u, f)) => (u.to_string(), format!("{:0<2}", f)),
        None => (s, "00".to_string()),
    };
    let body = format!("{},{}", group_thousands(&units), frac);
    if neg { format!("-{}", body) } else { body }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

// Active household/user settings

pub fn active_household_opt(conn: &Connection) -> Result<Option<i64>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='active_household'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(raw) => Ok(Some(raw.parse::<i64>().with_context(|| {
            format!("Corrupt active_household setting '{}'", raw)
        })?)),
        None => Ok(None),
    }
}

pub fn active_household(conn: &Connection) -> Result<i64> {
    active_household_opt(conn)?.context(
        "No active household. Create one with 'household add' or pick one with 'household use'",
    )
}

pub fn set_active_household(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('active_household', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![id.to_string()],
    )?;
    Ok(())
}

pub fn active_user(conn: &Connection) -> Result<Option<i64>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='active_user'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(raw) => Ok(Some(raw.parse::<i64>().with_context(|| {
            format!("Corrupt active_user setting '{}'", raw)
        })?)),
        None => Ok(None),
    }
}

pub fn set_active_user(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('active_user', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![id.to_string()],
    )?;
    Ok(())
}

// Name lookups, household-scoped

pub fn id_for_household(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM households WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Household '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_user(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE household_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![household_id, name], |r| r.get(0))
        .with_context(|| format!("User '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_account(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE household_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![household_id, name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_card(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM cards WHERE household_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![household_id, name], |r| r.get(0))
        .with_context(|| format!("Card '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE household_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![household_id, name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_tag(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM tags WHERE household_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![household_id, name], |r| r.get(0))
        .with_context(|| format!("Tag '{}' not found", name))?;
    Ok(id)
}
