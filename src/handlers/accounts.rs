use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{json, Value};

use crate::charts::series_color;
use crate::db::queries::{accounts, categories, transactions};
use crate::error::{AppError, AppResult};
use crate::format::{amount_to_cents, cents_to_amount, format_currency, to_db_date};
use crate::models::{Account, AccountPayload, CategoryType, DEFAULT_ACCOUNT_COLOR};
use crate::state::AppState;

fn account_json(account: &Account) -> Value {
    json!({
        "id": account.id,
        "name": account.name,
        "balance": cents_to_amount(account.balance_cents),
        "formatted_balance": format_currency(account.balance_cents),
        "color": account.color,
        "created_at": account.created_at,
    })
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let accounts = accounts::list_accounts(&conn)?;
    let total_cents: i64 = accounts.iter().map(|a| a.balance_cents).sum();

    Ok(Json(json!({
        "status": "success",
        "data": {
            "accounts": accounts.iter().map(account_json).collect::<Vec<_>>(),
            "total_balance": cents_to_amount(total_cents),
            "formatted_total_balance": format_currency(total_cents),
        },
    })))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let account = accounts::get_account(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))?;
    let transaction_count = accounts::transaction_count(&conn, id)?;

    let mut data = account_json(&account);
    data["transaction_count"] = json!(transaction_count);

    Ok(Json(json!({ "status": "success", "data": data })))
}

fn required_name(payload: &AccountPayload) -> AppResult<String> {
    match payload.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(AppError::missing_fields(
            "Account name is required",
            vec!["name".to_string()],
        )),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<AccountPayload>,
) -> AppResult<Json<Value>> {
    let name = required_name(&payload)?;
    let balance_cents = match payload.balance {
        Some(balance) if balance != 0.0 => amount_to_cents(balance)?,
        _ => 0,
    };
    let color = payload
        .color
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_ACCOUNT_COLOR.to_string());

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    if accounts::find_account_by_name(&tx, &name, None)?.is_some() {
        return Err(AppError::validation(format!(
            "An account named \"{}\" already exists",
            name
        )));
    }

    let id = accounts::create_account(&tx, &name, balance_cents, &color)?;

    // An opening balance is booked as a real income transaction so the
    // ledger explains where the balance came from.
    if balance_cents > 0 {
        let category_id = categories::find_or_create(&tx, "Initial Deposit", CategoryType::Income)?;
        transactions::create_transaction(
            &tx,
            balance_cents,
            "Initial deposit",
            &to_db_date(chrono::Local::now().naive_local()),
            id,
            Some(category_id),
            None,
        )?;
    }

    let account = accounts::get_account(&tx, id)?
        .ok_or_else(|| AppError::Internal("Account missing after insert".to_string()))?;
    tx.commit()?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Account \"{}\" created", account.name),
        "data": account_json(&account),
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AccountPayload>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;

    let existing = accounts::get_account(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))?;

    let name = match payload.name.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => existing.name.clone(),
    };
    if accounts::find_account_by_name(&tx, &name, Some(id))?.is_some() {
        return Err(AppError::validation(format!(
            "An account named \"{}\" already exists",
            name
        )));
    }
    let color = payload
        .color
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| existing.color.clone());

    accounts::update_account(&tx, id, &name, &color)?;

    // A manual balance edit is booked as an adjustment transaction instead
    // of silently rewriting the balance.
    if let Some(balance) = payload.balance {
        if !balance.is_finite() || balance < 0.0 {
            return Err(AppError::validation("Balance cannot be negative"));
        }
        let new_cents = (balance * 100.0).round() as i64;
        let delta = new_cents - existing.balance_cents;
        if delta != 0 {
            let (category_type, description) = if delta > 0 {
                (CategoryType::Income, "Balance adjustment (increase)")
            } else {
                (CategoryType::Expense, "Balance adjustment (decrease)")
            };
            let category_id = categories::find_or_create(&tx, "Balance Adjustment", category_type)?;
            transactions::create_transaction(
                &tx,
                delta.abs(),
                description,
                &to_db_date(chrono::Local::now().naive_local()),
                id,
                Some(category_id),
                None,
            )?;
            accounts::adjust_balance(&tx, id, delta)?;
        }
    }

    let account = accounts::get_account(&tx, id)?
        .ok_or_else(|| AppError::Internal("Account missing after update".to_string()))?;
    tx.commit()?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Account \"{}\" updated", account.name),
        "data": account_json(&account),
    })))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let account = accounts::get_account(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))?;

    let count = accounts::transaction_count(&conn, id)?;
    if count > 0 {
        return Err(AppError::validation(format!(
            "Cannot delete account \"{}\". It has {} associated transaction(s). \
             Delete or move them first.",
            account.name, count
        )));
    }

    accounts::delete_account(&conn, id)?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Account \"{}\" deleted", account.name),
    })))
}

/// Doughnut-chart series of positive account balances.
pub async fn chart_data(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let accounts: Vec<Account> = accounts::list_accounts(&conn)?
        .into_iter()
        .filter(|a| a.balance_cents > 0)
        .collect();

    let labels: Vec<&str> = accounts.iter().map(|a| a.name.as_str()).collect();
    let data: Vec<f64> = accounts
        .iter()
        .map(|a| cents_to_amount(a.balance_cents))
        .collect();
    let background_color: Vec<String> = accounts
        .iter()
        .enumerate()
        .map(|(i, a)| series_color(Some(&a.color), i))
        .collect();

    Ok(Json(json!({
        "status": "success",
        "data": {
            "labels": labels,
            "data": data,
            "backgroundColor": background_color,
        },
    })))
}
