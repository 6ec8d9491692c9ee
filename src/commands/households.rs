// Copyright (c) 2025 AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{active_household_opt, id_for_household, pretty_table, set_active_household};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute("INSERT INTO households(name) VALUES (?1)", params![name])?;
            let id = conn.last_insert_rowid();
            if active_household_opt(conn)?.is_none() {
                set_active_household(conn, id)?;
                println!("Added household '{}' (now active)", name);
            } else {
                println!("Added household '{}'", name);
            }
        }
        Some(("list", _)) => {
            let active = active_household_opt(conn)?;
            let mut stmt =
                conn.prepare("SELECT id, name, created_at FROM households ORDER BY name")?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (id, name, created) = row?;
                let mark = if active == Some(id) { "*" } else { "" };
                data.push(vec![mark.to_string(), id.to_string(), name, created]);
            }
            println!("{}", pretty_table(&["", "ID", "Name", "Created"], data));
        }
        Some(("use", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_household(conn, name)?;
            set_active_household(conn, id)?;
            // The active user belongs to the previous household
            conn.execute("DELETE FROM settings WHERE key='active_user'", [])?;
            println!("Active household is now '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
