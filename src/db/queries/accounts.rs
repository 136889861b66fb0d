use crate::models::Account;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        balance_cents: row.get(2)?,
        color: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn list_accounts(conn: &Connection) -> rusqlite::Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, balance_cents, color, created_at
         FROM accounts
         ORDER BY name COLLATE NOCASE",
    )?;

    let accounts: Vec<Account> = stmt
        .query_map([], row_to_account)?
        .filter_map(|a| a.ok())
        .collect();

    debug!(count = accounts.len(), "Listed accounts");
    Ok(accounts)
}

pub fn get_account(conn: &Connection, id: i64) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        "SELECT id, name, balance_cents, color, created_at FROM accounts WHERE id = ?",
        [id],
        row_to_account,
    )
    .optional()
}

/// Case-insensitive name lookup for duplicate checks. `exclude_id` skips the
/// account being edited.
pub fn find_account_by_name(
    conn: &Connection,
    name: &str,
    exclude_id: Option<i64>,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM accounts WHERE name = ? COLLATE NOCASE AND id != ?",
        params![name, exclude_id.unwrap_or(-1)],
        |row| row.get(0),
    )
    .optional()
}

pub fn create_account(
    conn: &Connection,
    name: &str,
    balance_cents: i64,
    color: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO accounts (name, balance_cents, color) VALUES (?, ?, ?)",
        params![name, balance_cents, color],
    )?;
    let id = conn.last_insert_rowid();
    info!(account_id = id, name = %name, "Created account");
    Ok(id)
}

pub fn update_account(
    conn: &Connection,
    id: i64,
    name: &str,
    color: &str,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE accounts SET name = ?, color = ? WHERE id = ?",
        params![name, color, id],
    )?;
    Ok(rows > 0)
}

/// Shift an account balance by `delta_cents` (negative to debit).
pub fn adjust_balance(conn: &Connection, id: i64, delta_cents: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE accounts SET balance_cents = balance_cents + ? WHERE id = ?",
        params![delta_cents, id],
    )?;
    Ok(())
}

pub fn delete_account(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM accounts WHERE id = ?", [id])?;
    if rows > 0 {
        info!(account_id = id, "Deleted account");
    }
    Ok(rows > 0)
}

/// Number of transactions booked against the account, transfer legs included.
pub fn transaction_count(conn: &Connection, account_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id = ?",
        [account_id],
        |row| row.get(0),
    )
}
