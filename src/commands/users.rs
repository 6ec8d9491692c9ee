// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{active_household, active_user, id_for_user, pretty_table, set_active_user};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let household_id = active_household(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute(
                "INSERT INTO users(household_id, name) VALUES (?1, ?2)",
                params![household_id, name],
            )?;
            println!("Added user '{}'", name);
        }
        Some(("list", _)) => {
            let active = active_user(conn)?;
            let mut stmt = conn.prepare(
                "SELECT id, name, created_at FROM users WHERE household_id=?1 ORDER BY name",
            )?;
            let rows = stmt.query_map(params![household_id], |r| {
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
            let id = id_for_user(conn, household_id, name)?;
            set_active_user(conn, id)?;
            println!("New transactions will be recorded by '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
