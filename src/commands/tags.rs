// Copyright (c) 2025 AlphaVelocity.
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
            conn.execute(
                "INSERT INTO tags(household_id, name) VALUES (?1, ?2)",
                params![household_id, name],
            )?;
            println!("Added tag '{}'", name);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT name FROM tags WHERE household_id=?1 ORDER BY name")?;
            let rows = stmt.query_map(params![household_id], |r| r.get::<_, String>(0))?;
            let mut data = Vec::new();
            for row in rows {
                data.push(vec![row?]);
            }
            println!("{}", pretty_table(&["Tag"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let n = conn.execute(
                "DELETE FROM tags WHERE household_id=?1 AND name=?2",
                params![household_id, name],
            )?;
            if n == 0 {
                bail!("Tag '{}' not found", name);
            }
            println!("Removed tag '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
