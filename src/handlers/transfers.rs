use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::db::queries::{accounts, transactions, transfers};
use crate::error::{AppError, AppResult};
use crate::format::{
    amount_to_cents, cents_to_amount, format_currency, format_date_short, parse_date_input,
    to_db_date,
};
use crate::form_utils::deserialize_lenient_i64;
use crate::models::{selectable_counterparts, TransferPayload, TransferWithAccounts};
use crate::state::AppState;

fn transfer_json(t: &TransferWithAccounts) -> Value {
    let inner = &t.transfer;
    let formatted_date = chrono::NaiveDateTime::parse_from_str(&inner.date, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(format_date_short);
    json!({
        "id": inner.id,
        "amount": cents_to_amount(inner.amount_cents),
        "formatted_amount": format_currency(inner.amount_cents),
        "description": inner.description,
        "date": inner.date,
        "formatted_date": formatted_date,
        "from_account_id": inner.from_account_id,
        "from_account_name": t.from_account_name,
        "to_account_id": inner.to_account_id,
        "to_account_name": t.to_account_name,
        "from_transaction_id": inner.from_transaction_id,
        "to_transaction_id": inner.to_transaction_id,
    })
}

/// Create a transfer: one transfer row, two linked legs, two balance
/// updates, all in one SQL transaction.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<TransferPayload>,
) -> AppResult<Json<Value>> {
    let mut missing = Vec::new();
    if payload.from_account_id.is_none() {
        missing.push("from_account_id".to_string());
    }
    if payload.to_account_id.is_none() {
        missing.push("to_account_id".to_string());
    }
    if payload.amount.is_none() {
        missing.push("amount".to_string());
    }
    let (Some(from_id), Some(to_id), Some(amount)) =
        (payload.from_account_id, payload.to_account_id, payload.amount)
    else {
        return Err(AppError::missing_fields(
            "Both accounts and an amount are required",
            missing,
        ));
    };

    if from_id == to_id {
        return Err(AppError::validation(
            "Cannot transfer to the same account",
        ));
    }
    let amount_cents = amount_to_cents(amount)?;
    let date = to_db_date(parse_date_input(payload.date.as_deref())?);
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    let from_account = accounts::get_account(&tx, from_id)?
        .ok_or_else(|| AppError::validation("Source account does not exist"))?;
    let to_account = accounts::get_account(&tx, to_id)?
        .ok_or_else(|| AppError::validation("Destination account does not exist"))?;

    if from_account.balance_cents < amount_cents {
        return Err(AppError::validation(format!(
            "Insufficient balance in \"{}\" ({} available)",
            from_account.name,
            format_currency(from_account.balance_cents)
        )));
    }

    let transfer_id = transfers::insert_transfer(
        &tx,
        amount_cents,
        description,
        &date,
        from_id,
        to_id,
    )?;

    let from_leg = transactions::create_transaction(
        &tx,
        amount_cents,
        &format!("Transfer to {}", to_account.name),
        &date,
        from_id,
        None,
        Some(transfer_id),
    )?;
    let to_leg = transactions::create_transaction(
        &tx,
        amount_cents,
        &format!("Transfer from {}", from_account.name),
        &date,
        to_id,
        None,
        Some(transfer_id),
    )?;
    transfers::set_legs(&tx, transfer_id, from_leg, to_leg)?;

    accounts::adjust_balance(&tx, from_id, -amount_cents)?;
    accounts::adjust_balance(&tx, to_id, amount_cents)?;

    let transfer = transfers::get_transfer_with_accounts(&tx, transfer_id)?
        .ok_or_else(|| AppError::Internal("Transfer missing after insert".to_string()))?;
    tx.commit()?;

    info!(transfer_id, amount_cents, "Created transfer");
    Ok(Json(json!({
        "status": "success",
        "message": format!(
            "Transferred {} from \"{}\" to \"{}\"",
            format_currency(amount_cents),
            from_account.name,
            to_account.name
        ),
        "data": transfer_json(&transfer),
    })))
}

/// Full transfer detail: both accounts with their current balances and both
/// leg ids, enough for the client to confirm a reversal.
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let transfer = transfers::get_transfer_with_accounts(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Transfer {} not found", id)))?;

    let from_account = accounts::get_account(&conn, transfer.transfer.from_account_id)?
        .ok_or_else(|| AppError::Internal("Transfer source account missing".to_string()))?;
    let to_account = accounts::get_account(&conn, transfer.transfer.to_account_id)?
        .ok_or_else(|| AppError::Internal("Transfer destination account missing".to_string()))?;

    let mut data = transfer_json(&transfer);
    data["from_account_balance"] = json!(cents_to_amount(from_account.balance_cents));
    data["to_account_balance"] = json!(cents_to_amount(to_account.balance_cents));

    Ok(Json(json!({ "status": "success", "data": data })))
}

/// Undo a transfer: restore both balances, delete both legs, delete the
/// transfer row. Atomic.
pub async fn reverse(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    let transfer = transfers::get_transfer(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("Transfer {} not found", id)))?;

    accounts::adjust_balance(&tx, transfer.from_account_id, transfer.amount_cents)?;
    accounts::adjust_balance(&tx, transfer.to_account_id, -transfer.amount_cents)?;
    transactions::delete_transaction(&tx, transfer.from_transaction_id)?;
    transactions::delete_transaction(&tx, transfer.to_transaction_id)?;
    transfers::delete_transfer(&tx, id)?;

    tx.commit()?;

    info!(transfer_id = id, "Reversed transfer");
    Ok(Json(json!({
        "status": "success",
        "message": format!(
            "Transfer of {} reversed",
            format_currency(transfer.amount_cents)
        ),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub page: Option<i64>,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub per_page: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Value>> {
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let conn = state.db.get()?;

    let total = transfers::count_transfers(&conn)?;
    let pages = if total == 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    };
    let page = params.page.unwrap_or(1).clamp(1, pages);

    let rows = transfers::list_transfers(&conn, per_page, (page - 1) * per_page)?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "transfers": rows.iter().map(transfer_json).collect::<Vec<_>>(),
            "pagination": {
                "page": page,
                "pages": pages,
                "per_page": per_page,
                "total": total,
                "has_next": page < pages,
                "has_prev": page > 1,
            },
        },
    })))
}

/// Latest five transfers for the sidebar widget.
pub async fn recent(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let rows = transfers::list_transfers(&conn, 5, 0)?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "transfers": rows.iter().map(transfer_json).collect::<Vec<_>>(),
            "count": rows.len(),
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct OptionsParams {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub exclude: Option<i64>,
}

/// Accounts selectable as the other side of a transfer, excluding the one
/// already chosen.
pub async fn options(
    State(state): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let accounts = accounts::list_accounts(&conn)?;
    let choices = selectable_counterparts(&accounts, params.exclude);

    Ok(Json(json!({
        "status": "success",
        "data": choices.iter().map(|a| json!({
            "id": a.id,
            "name": a.name,
            "balance": cents_to_amount(a.balance_cents),
            "formatted_balance": format_currency(a.balance_cents),
        })).collect::<Vec<_>>(),
    })))
}

/// Overall and current-month transfer totals plus the busiest account pairs.
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;

    let today = chrono::Local::now().date_naive();
    let month_start = format!("{}-01T00:00:00", today.format("%Y-%m"));
    let (total_count, total_cents, month_count, month_cents) =
        transfers::summary_totals(&conn, &month_start)?;
    let pairs = transfers::top_account_pairs(&conn, 5)?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "total_count": total_count,
            "total_amount": cents_to_amount(total_cents),
            "formatted_total_amount": format_currency(total_cents),
            "month_count": month_count,
            "month_amount": cents_to_amount(month_cents),
            "formatted_month_amount": format_currency(month_cents),
            "top_pairs": pairs.iter().map(|(from, to, uses, cents)| json!({
                "from_account": from,
                "to_account": to,
                "count": uses,
                "amount": cents_to_amount(*cents),
            })).collect::<Vec<_>>(),
        },
    })))
}
