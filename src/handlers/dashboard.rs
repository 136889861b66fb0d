use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::charts::percentage_precise;
use crate::db::queries::transactions;
use crate::error::AppResult;
use crate::form_utils::deserialize_lenient_i64;
use crate::format::{cents_to_amount, format_currency};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PeriodParams {
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub days: Option<i64>,
}

fn last_days_range(days: i64) -> (chrono::NaiveDateTime, chrono::NaiveDateTime) {
    let now = chrono::Local::now().naive_local();
    (now - Duration::days(days), now)
}

/// Headline numbers: all-time balance plus totals for the trailing period.
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> AppResult<Json<Value>> {
    let days = params.days.unwrap_or(30).clamp(1, 3650);
    let conn = state.db.get()?;

    let (all_income, all_expenses, _) = transactions::period_totals(&conn, None)?;
    let (period_income, period_expenses, count) =
        transactions::period_totals(&conn, Some(last_days_range(days)))?;

    debug!(days, count, "Dashboard stats computed");
    Ok(Json(json!({
        "status": "success",
        "data": {
            "total_balance": cents_to_amount(all_income - all_expenses),
            "formatted_total_balance": format_currency(all_income - all_expenses),
            "period_income": cents_to_amount(period_income),
            "period_expenses": cents_to_amount(period_expenses),
            "period_net": cents_to_amount(period_income - period_expenses),
            "transaction_count": count,
            "period_days": days,
        },
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecentParams {
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub limit: Option<i64>,
}

pub async fn recent_transactions(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> AppResult<Json<Value>> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let conn = state.db.get()?;
    let rows = transactions::recent_transactions(&conn, limit)?;

    Ok(Json(json!({
        "status": "success",
        "data": rows.iter().map(|t| json!({
            "id": t.transaction.id,
            "amount": cents_to_amount(t.transaction.amount_cents),
            "formatted_amount": format_currency(t.transaction.amount_cents),
            "description": t.transaction.description,
            "category": t.category_name.clone().unwrap_or_else(|| "Uncategorized".into()),
            "transaction_type": t.category_type.clone().unwrap_or_else(|| "expense".into()),
            "date": t.transaction.date,
        })).collect::<Vec<_>>(),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BreakdownParams {
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub days: Option<i64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

/// Per-category share of spending (or income) over the trailing period.
pub async fn category_breakdown(
    State(state): State<AppState>,
    Query(params): Query<BreakdownParams>,
) -> AppResult<Json<Value>> {
    let days = params.days.unwrap_or(30).clamp(1, 3650);
    let transaction_type = match params.transaction_type.as_deref() {
        Some("income") => "income",
        _ => "expense",
    };

    let conn = state.db.get()?;
    let totals =
        transactions::totals_by_category(&conn, transaction_type, Some(last_days_range(days)))?;
    let total_cents: i64 = totals.iter().map(|t| t.total_cents).sum();

    Ok(Json(json!({
        "status": "success",
        "data": {
            "categories": totals.iter().map(|t| json!({
                "name": t.name,
                "emoji": t.emoji,
                "amount": cents_to_amount(t.total_cents),
                "percentage": percentage_precise(t.total_cents, total_cents),
                "formatted_amount": format_currency(t.total_cents),
            })).collect::<Vec<_>>(),
            "total_amount": cents_to_amount(total_cents),
            "period_days": days,
            "transaction_type": transaction_type,
        },
    })))
}

/// Income, expenses and net for each of the last twelve months, oldest
/// first.
pub async fn monthly_trend(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let today = chrono::Local::now().date_naive();

    let mut months = Vec::with_capacity(12);
    for i in (0..12).rev() {
        let month_start = shift_month_start(today, -i);
        let month_end = next_month_start(month_start) - Duration::days(1);

        let range = (
            month_start.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
            month_end
                .and_hms_micro_opt(23, 59, 59, 999_999)
                .expect("end of day is always valid"),
        );
        let (income, expenses, _) = transactions::period_totals(&conn, Some(range))?;

        months.push(json!({
            "month": month_start.format("%B").to_string(),
            "month_num": month_start.month(),
            "year": month_start.year(),
            "income": cents_to_amount(income),
            "expenses": cents_to_amount(expenses),
            "net": cents_to_amount(income - expenses),
        }));
    }

    Ok(Json(json!({ "status": "success", "data": months })))
}

/// Per-day income/expense/net for the current month. Days without activity
/// are filled with zeros so the chart axis is continuous.
pub async fn daily_activity(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let today = chrono::Local::now().date_naive();

    let month_start = shift_month_start(today, 0);
    let month_end = next_month_start(month_start) - Duration::days(1);
    let totals = transactions::daily_totals(
        &conn,
        month_start.and_hms_opt(0, 0, 0).expect("midnight is always valid"),
        month_end
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .expect("end of day is always valid"),
    )?;

    let mut by_day = std::collections::HashMap::new();
    for (day, income, expenses) in totals {
        by_day.insert(day, (income, expenses));
    }

    let mut days = Vec::new();
    let mut current = month_start;
    while current <= month_end {
        let key = current.format("%Y-%m-%d").to_string();
        let (income, expenses) = by_day.get(&key).copied().unwrap_or((0, 0));
        days.push(json!({
            "day": current.day(),
            "date": key,
            "income": cents_to_amount(income),
            "expenses": cents_to_amount(expenses),
            "net": cents_to_amount(income - expenses),
        }));
        current += Duration::days(1);
    }

    Ok(Json(json!({ "status": "success", "data": days })))
}

fn shift_month_start(date: NaiveDate, months: i64) -> NaiveDate {
    let total = date.year() as i64 * 12 + date.month() as i64 - 1 + months;
    let year = total.div_euclid(12) as i32;
    let month = (total.rem_euclid(12) + 1) as u32;
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is always valid")
}

fn next_month_start(month_start: NaiveDate) -> NaiveDate {
    shift_month_start(month_start, 1)
}
