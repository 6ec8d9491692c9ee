// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{active_household, pretty_table};
use anyhow::{bail, Result};
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let typ = sub.get_one::<String>("type").unwrap();
            conn.execute(
                "INSERT INTO accounts(household_id, name, type) VALUES (?1, ?2, ?3)",
                params![household_id, name, typ],
            )?;
            println!("Added account '{}' ({})", name, typ);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT name, type, created_at FROM accounts WHERE household_id=?1 ORDER BY name",
            )?;
            let rows = stmt.query_map(params![household_id], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, t, cr) = row?;
                data.push(vec![n, t, cr]);
            }
            println!("{}", pretty_table(&["Name", "Type", "Created"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let n = conn.execute(
                "DELETE FROM accounts WHERE household_id=?1 AND name=?2",
                params![household_id, name],
            )?;
            if n == 0 {
                bail!("Account '{}' not found", name);
            }
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
