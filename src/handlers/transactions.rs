use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::db::queries::transactions::{self, TransactionQuery};
use crate::db::queries::{accounts, categories};
use crate::error::{AppError, AppResult};
use crate::filter::{FilterParams, FilterState};
use crate::form_utils::deserialize_lenient_i64;
use crate::format::{
    amount_to_cents, cents_to_amount, format_currency, format_date_short, parse_date_input,
    to_db_date,
};
use crate::models::{TransactionPayload, TransactionWithRelations};
use crate::state::AppState;

fn transaction_json(t: &TransactionWithRelations) -> Value {
    let inner = &t.transaction;
    json!({
        "id": inner.id,
        "amount": cents_to_amount(inner.amount_cents),
        "formatted_amount": format_currency(inner.amount_cents),
        "description": inner.description,
        "date": inner.date,
        "formatted_date": inner.parsed_date().map(format_date_short),
        "account_id": inner.account_id,
        "account_name": t.account_name,
        "category_id": inner.category_id,
        "category_name": t.category_name,
        "category_type": t.category_type,
        "category_emoji": t.category_emoji,
        "is_transfer": inner.is_transfer(),
        "transfer_id": inner.transfer_id,
    })
}

fn build_query(filter: &FilterState) -> TransactionQuery {
    TransactionQuery {
        category_id: filter.category_id,
        account_id: filter.account_id,
        search: filter.search.clone(),
        ..Default::default()
    }
    .with_range(filter.date_range(chrono::Local::now().date_naive()))
}

/// Effect of a posting on its account balance: income credits, expense
/// debits. Used forwards to apply and negated to revert.
fn posting_delta(category_type: Option<&str>, amount_cents: i64) -> i64 {
    match category_type {
        Some("income") => amount_cents,
        _ => -amount_cents,
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<Value>> {
    let filter = FilterState::from_params(&params);
    let conn = state.db.get()?;

    let base_query = build_query(&filter);
    let total = transactions::count_transactions(&conn, &base_query)?;
    let pages = if total == 0 {
        1
    } else {
        (total + filter.per_page - 1) / filter.per_page
    };
    let page = filter.page.min(pages);

    let query = TransactionQuery {
        limit: Some(filter.per_page),
        offset: Some((page - 1) * filter.per_page),
        ..base_query
    };
    let rows = transactions::list_transactions(&conn, &query)?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "transactions": rows.iter().map(transaction_json).collect::<Vec<_>>(),
            "pagination": {
                "page": page,
                "pages": pages,
                "per_page": filter.per_page,
                "total": total,
                "has_next": page < pages,
                "has_prev": page > 1,
            },
            "filter": {
                "name": filter.display_name(),
                "query_string": filter.query_string(),
            },
        },
    })))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let row = transactions::get_transaction(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    Ok(Json(json!({ "status": "success", "data": transaction_json(&row) })))
}

/// Validate a create/update payload, naming every missing field.
fn validated_payload(payload: &TransactionPayload) -> AppResult<(i64, String, i64, i64)> {
    let mut missing = Vec::new();

    if payload.amount.is_none() {
        missing.push("amount".to_string());
    }
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if description.is_none() {
        missing.push("description".to_string());
    }
    if payload.account_id.is_none() {
        missing.push("account_id".to_string());
    }
    if payload.category_id.is_none() {
        missing.push("category_id".to_string());
    }

    match (payload.amount, description, payload.account_id, payload.category_id) {
        (Some(amount), Some(description), Some(account_id), Some(category_id)) => Ok((
            amount_to_cents(amount)?,
            description.to_string(),
            account_id,
            category_id,
        )),
        _ => Err(AppError::missing_fields(
            "Please fill in all required fields",
            missing,
        )),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<TransactionPayload>,
) -> AppResult<Json<Value>> {
    let (amount_cents, description, account_id, category_id) = validated_payload(&payload)?;
    let date = to_db_date(parse_date_input(payload.date.as_deref())?);

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    accounts::get_account(&tx, account_id)?
        .ok_or_else(|| AppError::validation("Selected account does not exist"))?;
    let category = categories::get_category(&tx, category_id)?
        .ok_or_else(|| AppError::validation("Selected category does not exist"))?;

    let id = transactions::create_transaction(
        &tx,
        amount_cents,
        &description,
        &date,
        account_id,
        Some(category_id),
        None,
    )?;
    accounts::adjust_balance(
        &tx,
        account_id,
        posting_delta(Some(category.category_type.as_str()), amount_cents),
    )?;

    let row = transactions::get_transaction(&tx, id)?
        .ok_or_else(|| AppError::Internal("Transaction missing after insert".to_string()))?;
    tx.commit()?;

    info!(transaction_id = id, amount_cents, "Created transaction");
    Ok(Json(json!({
        "status": "success",
        "message": "Transaction created",
        "data": transaction_json(&row),
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionPayload>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    let existing = transactions::get_transaction(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;
    if existing.transaction.is_transfer() {
        return Err(AppError::TransferLocked(
            "This transaction belongs to a transfer. Use the transfer actions instead.".to_string(),
        ));
    }

    let (amount_cents, description, account_id, category_id) = validated_payload(&payload)?;
    let date = match payload.date.as_deref() {
        Some(d) => to_db_date(parse_date_input(Some(d))?),
        None => existing.transaction.date.clone(),
    };

    accounts::get_account(&tx, account_id)?
        .ok_or_else(|| AppError::validation("Selected account does not exist"))?;
    let category = categories::get_category(&tx, category_id)?
        .ok_or_else(|| AppError::validation("Selected category does not exist"))?;

    // Revert the old posting, then apply the new one. Handles account and
    // category moves in the same pass.
    accounts::adjust_balance(
        &tx,
        existing.transaction.account_id,
        -posting_delta(
            existing.category_type.as_deref(),
            existing.transaction.amount_cents,
        ),
    )?;
    transactions::update_transaction(
        &tx,
        id,
        amount_cents,
        &description,
        &date,
        account_id,
        Some(category_id),
    )?;
    accounts::adjust_balance(
        &tx,
        account_id,
        posting_delta(Some(category.category_type.as_str()), amount_cents),
    )?;

    let row = transactions::get_transaction(&tx, id)?
        .ok_or_else(|| AppError::Internal("Transaction missing after update".to_string()))?;
    tx.commit()?;

    Ok(Json(json!({
        "status": "success",
        "message": "Transaction updated",
        "data": transaction_json(&row),
    })))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    let existing = transactions::get_transaction(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;
    if existing.transaction.is_transfer() {
        return Err(AppError::TransferLocked(
            "This transaction belongs to a transfer. Reverse the transfer instead.".to_string(),
        ));
    }

    accounts::adjust_balance(
        &tx,
        existing.transaction.account_id,
        -posting_delta(
            existing.category_type.as_deref(),
            existing.transaction.amount_cents,
        ),
    )?;
    transactions::delete_transaction(&tx, id)?;
    tx.commit()?;

    Ok(Json(json!({
        "status": "success",
        "message": "Transaction deleted",
    })))
}

#[derive(Debug, Deserialize)]
pub struct BulkDeletePayload {
    #[serde(default)]
    pub transaction_ids: Vec<i64>,
}

/// Delete a batch of transactions, reverting each balance effect. The whole
/// batch fails if any id is unknown or belongs to a transfer.
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(payload): Json<BulkDeletePayload>,
) -> AppResult<Json<Value>> {
    if payload.transaction_ids.is_empty() {
        return Err(AppError::missing_fields(
            "No transactions selected",
            vec!["transaction_ids".to_string()],
        ));
    }

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    for &id in &payload.transaction_ids {
        let existing = transactions::get_transaction(&tx, id)?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;
        if existing.transaction.is_transfer() {
            return Err(AppError::TransferLocked(format!(
                "Transaction {} belongs to a transfer and cannot be deleted here",
                id
            )));
        }
        accounts::adjust_balance(
            &tx,
            existing.transaction.account_id,
            -posting_delta(
                existing.category_type.as_deref(),
                existing.transaction.amount_cents,
            ),
        )?;
        transactions::delete_transaction(&tx, id)?;
    }

    let count = payload.transaction_ids.len();
    tx.commit()?;

    info!(count, "Bulk-deleted transactions");
    Ok(Json(json!({
        "status": "success",
        "message": format!("Deleted {} transaction(s)", count),
        "data": { "deleted": count },
    })))
}

/// Period summary plus income and expense by-category breakdowns.
pub async fn statistics(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<Value>> {
    let filter = FilterState::from_params(&params);
    let range = filter.date_range(chrono::Local::now().date_naive());

    let conn = state.db.get()?;
    let (income_cents, expense_cents, count) = transactions::period_totals(&conn, range)?;

    let breakdown = |category_type: &str| -> AppResult<Vec<Value>> {
        let totals = transactions::totals_by_category(&conn, category_type, range)?;
        let sum: i64 = totals.iter().map(|t| t.total_cents).sum();
        Ok(totals
            .iter()
            .map(|t| {
                json!({
                    "category_id": t.category_id,
                    "name": t.name,
                    "emoji": t.emoji,
                    "amount": cents_to_amount(t.total_cents),
                    "formatted_amount": format_currency(t.total_cents),
                    "percentage": crate::charts::percentage(t.total_cents, sum),
                })
            })
            .collect())
    };

    Ok(Json(json!({
        "status": "success",
        "data": {
            "period": filter.display_name(),
            "total_income": cents_to_amount(income_cents),
            "total_expenses": cents_to_amount(expense_cents),
            "net": cents_to_amount(income_cents - expense_cents),
            "formatted_income": format_currency(income_cents),
            "formatted_expenses": format_currency(expense_cents),
            "formatted_net": format_currency(income_cents - expense_cents),
            "transaction_count": count,
            "income_by_category": breakdown("income")?,
            "expenses_by_category": breakdown("expense")?,
        },
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DescriptionParams {
    pub q: String,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub limit: Option<i64>,
}

/// Autocomplete suggestions from prior descriptions. Queries shorter than
/// two characters yield nothing.
pub async fn descriptions(
    State(state): State<AppState>,
    Query(params): Query<DescriptionParams>,
) -> AppResult<Json<Value>> {
    let q = params.q.trim();
    if q.chars().count() < 2 {
        return Ok(Json(json!({
            "status": "success",
            "data": { "suggestions": [] },
        })));
    }

    let conn = state.db.get()?;
    let suggestions = transactions::distinct_descriptions(&conn, q, params.limit.unwrap_or(8))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "suggestions": suggestions },
    })))
}

/// Filtered CSV export, no pagination.
pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<impl IntoResponse> {
    let filter = FilterState::from_params(&params);
    let conn = state.db.get()?;

    let rows = transactions::list_transactions(&conn, &build_query(&filter))?;
    debug!(count = rows.len(), "Exporting transactions to CSV");

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "date", "description", "category", "account", "amount"])?;
    for row in &rows {
        writer.write_record([
            row.transaction.id.to_string(),
            row.transaction.date.clone(),
            row.transaction.description.clone(),
            row.category_name.clone().unwrap_or_default(),
            row.account_name.clone(),
            format!("{:.2}", cents_to_amount(row.transaction.amount_cents)),
        ])?;
    }
    let csv_data = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV buffer error: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv_data,
    ))
}
