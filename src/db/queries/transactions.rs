use crate::models::{Transaction, TransactionWithRelations};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, trace};

/// Upper bound for the autocomplete `limit` parameter.
pub const MAX_SUGGESTIONS: i64 = 20;

/// Resolved list filter as SQL-ready values. Date bounds are pre-formatted
/// strings so they compare lexicographically with the stored dates.
#[derive(Debug, Default)]
pub struct TransactionQuery {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionQuery {
    pub fn with_range(mut self, range: Option<(NaiveDateTime, NaiveDateTime)>) -> Self {
        if let Some((start, end)) = range {
            self.from_date = Some(format_bound(start));
            self.to_date = Some(format_bound(end));
        }
        self
    }

    /// Append the filter's WHERE clauses. Transfer legs are always excluded.
    fn push_conditions(&self, sql: &mut String, params_vec: &mut Vec<Box<dyn rusqlite::ToSql>>) {
        sql.push_str(" AND t.transfer_id IS NULL");

        if let Some(ref from_date) = self.from_date {
            sql.push_str(" AND t.date >= ?");
            params_vec.push(Box::new(from_date.clone()));
        }
        if let Some(ref to_date) = self.to_date {
            sql.push_str(" AND t.date <= ?");
            params_vec.push(Box::new(to_date.clone()));
        }
        if let Some(category_id) = self.category_id {
            sql.push_str(" AND t.category_id = ?");
            params_vec.push(Box::new(category_id));
        }
        if let Some(account_id) = self.account_id {
            sql.push_str(" AND t.account_id = ?");
            params_vec.push(Box::new(account_id));
        }
        if let Some(ref search) = self.search {
            sql.push_str(
                " AND (t.description LIKE ? OR c.name LIKE ? OR a.name LIKE ?)",
            );
            let pattern = format!("%{}%", search);
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }
    }
}

/// Format a datetime bound for comparison against stored `date` strings.
pub fn format_bound(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

const SELECT_WITH_RELATIONS: &str =
    "SELECT t.id, t.amount_cents, t.description, t.date, t.account_id,
            t.category_id, t.transfer_id, t.created_at,
            c.name as category_name, c.type as category_type, c.emoji as category_emoji,
            a.name as account_name
     FROM transactions t
     LEFT JOIN categories c ON t.category_id = c.id
     JOIN accounts a ON t.account_id = a.id";

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionWithRelations> {
    Ok(TransactionWithRelations {
        transaction: Transaction {
            id: row.get(0)?,
            amount_cents: row.get(1)?,
            description: row.get(2)?,
            date: row.get(3)?,
            account_id: row.get(4)?,
            category_id: row.get(5)?,
            transfer_id: row.get(6)?,
            created_at: row.get(7)?,
        },
        category_name: row.get(8)?,
        category_type: row.get(9)?,
        category_emoji: row.get(10)?,
        account_name: row.get(11)?,
    })
}

pub fn list_transactions(
    conn: &Connection,
    query: &TransactionQuery,
) -> rusqlite::Result<Vec<TransactionWithRelations>> {
    let mut sql = format!("{} WHERE 1=1", SELECT_WITH_RELATIONS);
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    query.push_conditions(&mut sql, &mut params_vec);
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(limit));
    }
    if let Some(offset) = query.offset {
        sql.push_str(" OFFSET ?");
        params_vec.push(Box::new(offset));
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let transactions: Vec<TransactionWithRelations> = stmt
        .query_map(params_refs.as_slice(), row_to_transaction)?
        .filter_map(|t| t.ok())
        .collect();

    debug!(count = transactions.len(), "Listed transactions");
    Ok(transactions)
}

pub fn count_transactions(conn: &Connection, query: &TransactionQuery) -> rusqlite::Result<i64> {
    let mut sql = String::from(
        "SELECT COUNT(*)
         FROM transactions t
         LEFT JOIN categories c ON t.category_id = c.id
         JOIN accounts a ON t.account_id = a.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    query.push_conditions(&mut sql, &mut params_vec);

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))
}

/// Fetch one transaction with relations. Transfer legs are included here so
/// the detail endpoint can flag them.
pub fn get_transaction(
    conn: &Connection,
    id: i64,
) -> rusqlite::Result<Option<TransactionWithRelations>> {
    trace!(transaction_id = id, "Fetching transaction");
    conn.query_row(
        &format!("{} WHERE t.id = ?", SELECT_WITH_RELATIONS),
        [id],
        row_to_transaction,
    )
    .optional()
}

#[allow(clippy::too_many_arguments)]
pub fn create_transaction(
    conn: &Connection,
    amount_cents: i64,
    description: &str,
    date: &str,
    account_id: i64,
    category_id: Option<i64>,
    transfer_id: Option<i64>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO transactions (amount_cents, description, date, account_id, category_id, transfer_id)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![amount_cents, description, date, account_id, category_id, transfer_id],
    )?;
    let id = conn.last_insert_rowid();
    debug!(transaction_id = id, amount_cents, "Created transaction");
    Ok(id)
}

pub fn update_transaction(
    conn: &Connection,
    id: i64,
    amount_cents: i64,
    description: &str,
    date: &str,
    account_id: i64,
    category_id: Option<i64>,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE transactions
         SET amount_cents = ?, description = ?, date = ?, account_id = ?, category_id = ?
         WHERE id = ?",
        params![amount_cents, description, date, account_id, category_id, id],
    )?;
    Ok(rows > 0)
}

pub fn delete_transaction(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM transactions WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(transaction_id = id, "Deleted transaction");
    }
    Ok(rows > 0)
}

/// Distinct prior descriptions matching `q`, most recently used first.
pub fn distinct_descriptions(
    conn: &Connection,
    q: &str,
    limit: i64,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT description FROM transactions
         WHERE transfer_id IS NULL AND description LIKE ?
         GROUP BY description
         ORDER BY MAX(date) DESC
         LIMIT ?",
    )?;

    let suggestions: Vec<String> = stmt
        .query_map(
            params![format!("%{}%", q), limit.clamp(1, MAX_SUGGESTIONS)],
            |row| row.get(0),
        )?
        .filter_map(|s| s.ok())
        .collect();

    trace!(q = %q, count = suggestions.len(), "Autocomplete suggestions");
    Ok(suggestions)
}

/// Income and expense totals (in cents) plus transaction count within the
/// optional range. Transfer legs excluded.
pub fn period_totals(
    conn: &Connection,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
) -> rusqlite::Result<(i64, i64, i64)> {
    let mut sql = String::from(
        "SELECT
            COALESCE(SUM(CASE WHEN c.type = 'income' THEN t.amount_cents ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN c.type = 'expense' THEN t.amount_cents ELSE 0 END), 0),
            COUNT(*)
         FROM transactions t
         LEFT JOIN categories c ON t.category_id = c.id
         WHERE t.transfer_id IS NULL",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some((start, end)) = range {
        sql.push_str(" AND t.date >= ? AND t.date <= ?");
        params_vec.push(Box::new(format_bound(start)));
        params_vec.push(Box::new(format_bound(end)));
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.query_row(&sql, params_refs.as_slice(), |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    })
}

/// Per-category totals of one type within the optional range, largest first.
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub emoji: String,
    pub total_cents: i64,
}

pub fn totals_by_category(
    conn: &Connection,
    category_type: &str,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
) -> rusqlite::Result<Vec<CategoryTotal>> {
    let mut sql = String::from(
        "SELECT c.id, c.name, c.emoji, SUM(t.amount_cents) as total
         FROM transactions t
         JOIN categories c ON t.category_id = c.id
         WHERE c.type = ? AND t.transfer_id IS NULL",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> =
        vec![Box::new(category_type.to_string())];

    if let Some((start, end)) = range {
        sql.push_str(" AND t.date >= ? AND t.date <= ?");
        params_vec.push(Box::new(format_bound(start)));
        params_vec.push(Box::new(format_bound(end)));
    }
    sql.push_str(" GROUP BY c.id ORDER BY total DESC");

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let totals = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok(CategoryTotal {
                category_id: row.get(0)?,
                name: row.get(1)?,
                emoji: row.get(2)?,
                total_cents: row.get(3)?,
            })
        })?
        .filter_map(|t| t.ok())
        .collect();

    Ok(totals)
}

/// Per-day income and expense totals within the range, in date order.
pub fn daily_totals(
    conn: &Connection,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> rusqlite::Result<Vec<(String, i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT date(t.date) as day,
                COALESCE(SUM(CASE WHEN c.type = 'income' THEN t.amount_cents ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN c.type = 'expense' THEN t.amount_cents ELSE 0 END), 0)
         FROM transactions t
         LEFT JOIN categories c ON t.category_id = c.id
         WHERE t.transfer_id IS NULL AND t.date >= ? AND t.date <= ?
         GROUP BY day
         ORDER BY day",
    )?;

    let rows = stmt
        .query_map(params![format_bound(start), format_bound(end)], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(rows)
}

pub fn recent_transactions(
    conn: &Connection,
    limit: i64,
) -> rusqlite::Result<Vec<TransactionWithRelations>> {
    list_transactions(
        conn,
        &TransactionQuery {
            limit: Some(limit),
            ..Default::default()
        },
    )
}
