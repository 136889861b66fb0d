use crate::models::{Transfer, TransferWithAccounts};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

fn row_to_transfer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transfer> {
    Ok(Transfer {
        id: row.get(0)?,
        amount_cents: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        from_account_id: row.get(4)?,
        to_account_id: row.get(5)?,
        from_transaction_id: row.get(6)?,
        to_transaction_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const SELECT_WITH_ACCOUNTS: &str =
    "SELECT tr.id, tr.amount_cents, tr.description, tr.date,
            tr.from_account_id, tr.to_account_id,
            tr.from_transaction_id, tr.to_transaction_id, tr.created_at,
            fa.name as from_account_name, ta.name as to_account_name
     FROM transfers tr
     JOIN accounts fa ON tr.from_account_id = fa.id
     JOIN accounts ta ON tr.to_account_id = ta.id";

fn row_to_transfer_with_accounts(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<TransferWithAccounts> {
    Ok(TransferWithAccounts {
        transfer: row_to_transfer(row)?,
        from_account_name: row.get(9)?,
        to_account_name: row.get(10)?,
    })
}

/// Insert the transfer row. Leg ids are attached with [`set_legs`] once the
/// legs exist, inside the same SQL transaction.
pub fn insert_transfer(
    conn: &Connection,
    amount_cents: i64,
    description: Option<&str>,
    date: &str,
    from_account_id: i64,
    to_account_id: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO transfers (amount_cents, description, date, from_account_id, to_account_id)
         VALUES (?, ?, ?, ?, ?)",
        params![amount_cents, description, date, from_account_id, to_account_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_legs(
    conn: &Connection,
    transfer_id: i64,
    from_transaction_id: i64,
    to_transaction_id: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE transfers SET from_transaction_id = ?, to_transaction_id = ? WHERE id = ?",
        params![from_transaction_id, to_transaction_id, transfer_id],
    )?;
    info!(transfer_id, from_transaction_id, to_transaction_id, "Linked transfer legs");
    Ok(())
}

pub fn get_transfer(conn: &Connection, id: i64) -> rusqlite::Result<Option<Transfer>> {
    conn.query_row(
        "SELECT id, amount_cents, description, date, from_account_id, to_account_id,
                from_transaction_id, to_transaction_id, created_at
         FROM transfers WHERE id = ?",
        [id],
        row_to_transfer,
    )
    .optional()
}

pub fn get_transfer_with_accounts(
    conn: &Connection,
    id: i64,
) -> rusqlite::Result<Option<TransferWithAccounts>> {
    conn.query_row(
        &format!("{} WHERE tr.id = ?", SELECT_WITH_ACCOUNTS),
        [id],
        row_to_transfer_with_accounts,
    )
    .optional()
}

pub fn list_transfers(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> rusqlite::Result<Vec<TransferWithAccounts>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY tr.date DESC, tr.id DESC LIMIT ? OFFSET ?",
        SELECT_WITH_ACCOUNTS
    ))?;

    let transfers: Vec<TransferWithAccounts> = stmt
        .query_map(params![limit, offset], row_to_transfer_with_accounts)?
        .filter_map(|t| t.ok())
        .collect();

    debug!(count = transfers.len(), "Listed transfers");
    Ok(transfers)
}

pub fn count_transfers(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM transfers", [], |row| row.get(0))
}

pub fn delete_transfer(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM transfers WHERE id = ?", [id])?;
    Ok(rows > 0)
}

/// Totals for the transfer-summary widget: overall count and amount, plus
/// count and amount with `date >= month_start`.
pub fn summary_totals(
    conn: &Connection,
    month_start: &str,
) -> rusqlite::Result<(i64, i64, i64, i64)> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(amount_cents), 0),
                COALESCE(SUM(CASE WHEN date >= ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN date >= ?1 THEN amount_cents ELSE 0 END), 0)
         FROM transfers",
        [month_start],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )
}

/// Most frequent account pairs, for the transfer-summary widget.
pub fn top_account_pairs(
    conn: &Connection,
    limit: i64,
) -> rusqlite::Result<Vec<(String, String, i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT fa.name, ta.name, COUNT(*) as uses, COALESCE(SUM(tr.amount_cents), 0)
         FROM transfers tr
         JOIN accounts fa ON tr.from_account_id = fa.id
         JOIN accounts ta ON tr.to_account_id = ta.id
         GROUP BY tr.from_account_id, tr.to_account_id
         ORDER BY uses DESC, tr.from_account_id
         LIMIT ?",
    )?;

    let pairs = stmt
        .query_map([limit], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .filter_map(|p| p.ok())
        .collect();

    Ok(pairs)
}
