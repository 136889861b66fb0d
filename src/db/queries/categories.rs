use crate::db::queries::transactions::format_bound;
use crate::models::{Category, CategoryType};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let type_str: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: CategoryType::parse(&type_str).unwrap_or(CategoryType::Expense),
        emoji: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn list_categories(
    conn: &Connection,
    category_type: Option<CategoryType>,
) -> rusqlite::Result<Vec<Category>> {
    let mut sql = String::from("SELECT id, name, type, emoji, created_at FROM categories WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(t) = category_type {
        sql.push_str(" AND type = ?");
        params_vec.push(Box::new(t.as_str()));
    }
    sql.push_str(" ORDER BY name COLLATE NOCASE");

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let categories: Vec<Category> = stmt
        .query_map(params_refs.as_slice(), row_to_category)?
        .filter_map(|c| c.ok())
        .collect();

    debug!(count = categories.len(), "Listed categories");
    Ok(categories)
}

pub fn get_category(conn: &Connection, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name, type, emoji, created_at FROM categories WHERE id = ?",
        [id],
        row_to_category,
    )
    .optional()
}

/// Duplicate check on the `(name, type)` pair, case-insensitive.
/// `exclude_id` skips the category being edited.
pub fn find_duplicate(
    conn: &Connection,
    name: &str,
    category_type: CategoryType,
    exclude_id: Option<i64>,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM categories
         WHERE name = ? COLLATE NOCASE AND type = ? AND id != ?",
        params![name, category_type.as_str(), exclude_id.unwrap_or(-1)],
        |row| row.get(0),
    )
    .optional()
}

pub fn create_category(
    conn: &Connection,
    name: &str,
    category_type: CategoryType,
    emoji: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO categories (name, type, emoji) VALUES (?, ?, ?)",
        params![name, category_type.as_str(), emoji],
    )?;
    let id = conn.last_insert_rowid();
    debug!(category_id = id, name = %name, "Created category");
    Ok(id)
}

pub fn update_category(
    conn: &Connection,
    id: i64,
    name: &str,
    category_type: CategoryType,
    emoji: &str,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE categories SET name = ?, type = ?, emoji = ? WHERE id = ?",
        params![name, category_type.as_str(), emoji, id],
    )?;
    Ok(rows > 0)
}

pub fn delete_category(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM categories WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(category_id = id, "Deleted category");
    }
    Ok(rows > 0)
}

/// Number of transactions referencing the category. Guards deletion.
pub fn transaction_count(conn: &Connection, category_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE category_id = ?",
        [category_id],
        |row| row.get(0),
    )
}

/// Look up a category by exact `(name, type)`, creating it with the type's
/// default emoji when absent. Used for the bookkeeping categories behind
/// initial deposits and balance adjustments.
pub fn find_or_create(
    conn: &Connection,
    name: &str,
    category_type: CategoryType,
) -> rusqlite::Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE name = ? AND type = ?",
            params![name, category_type.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => create_category(conn, name, category_type, category_type.default_emoji()),
    }
}

/// Expense totals per category within the optional date range, largest first.
/// Transfer legs never carry a category, so they are excluded implicitly.
pub fn top_expense_categories(
    conn: &Connection,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
    limit: usize,
) -> rusqlite::Result<Vec<(Category, i64)>> {
    let mut sql = String::from(
        "SELECT c.id, c.name, c.type, c.emoji, c.created_at, SUM(t.amount_cents) as total
         FROM categories c
         JOIN transactions t ON t.category_id = c.id
         WHERE c.type = 'expense'",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some((start, end)) = range {
        sql.push_str(" AND t.date >= ? AND t.date <= ?");
        params_vec.push(Box::new(format_bound(start)));
        params_vec.push(Box::new(format_bound(end)));
    }
    sql.push_str(" GROUP BY c.id ORDER BY total DESC LIMIT ?");
    params_vec.push(Box::new(limit as i64));

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<(Category, i64)> = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok((row_to_category(row)?, row.get(5)?))
        })?
        .filter_map(|r| r.ok())
        .collect();

    debug!(count = rows.len(), "Computed top expense categories");
    Ok(rows)
}

/// Count of categories per type.
pub fn type_counts(conn: &Connection) -> rusqlite::Result<(i64, i64)> {
    conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN type = 'income' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN type = 'expense' THEN 1 ELSE 0 END), 0)
         FROM categories",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
}
