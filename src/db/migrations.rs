use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Apply any `.sql` files from `migrations_dir` that have not run yet, in
/// filename order. Applied names are tracked in the `_migrations` table.
pub fn run_migrations(conn: &Connection, migrations_dir: &Path) -> rusqlite::Result<()> {
    tracing::debug!(dir = %migrations_dir.display(), "Checking for database migrations");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let mut entries: Vec<_> = fs::read_dir(migrations_dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| {
                    e.path()
                        .extension()
                        .map(|ext| ext == "sql")
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();

    entries.sort_by_key(|e| e.file_name());

    let mut applied_count = 0;
    for entry in entries {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let already_applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = ?)",
            [&*name],
            |row| row.get(0),
        )?;

        if !already_applied {
            let sql = fs::read_to_string(entry.path())
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

            tracing::info!(migration = %name, "Applying migration");
            conn.execute_batch(&sql)?;

            conn.execute("INSERT INTO _migrations (name) VALUES (?)", [&*name])?;
            applied_count += 1;
        }
    }

    if applied_count > 0 {
        tracing::info!(count = applied_count, "Migrations applied");
    } else {
        tracing::debug!("No new migrations to apply");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_migrations_apply_in_order_and_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("002_second.sql"),
            "ALTER TABLE things ADD COLUMN note TEXT;",
        )
        .unwrap();
        fs::write(
            dir.path().join("001_first.sql"),
            "CREATE TABLE things (id INTEGER PRIMARY KEY);",
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, dir.path()).unwrap();

        conn.execute("INSERT INTO things (note) VALUES ('x')", [])
            .unwrap();

        // Running again is a no-op.
        run_migrations(&conn, dir.path()).unwrap();
        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 2);
    }

    #[test]
    fn test_missing_directory_is_tolerated() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, Path::new("/nonexistent/migrations")).unwrap();
    }
}
