use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde_json::{json, Value};

use crate::charts::{bubble_layout, percentage, series_color, TOP_CATEGORIES_LIMIT};
use crate::db::queries::{categories, transactions};
use crate::error::{AppError, AppResult};
use crate::filter::{FilterParams, FilterState};
use crate::format::{cents_to_amount, format_currency};
use crate::models::{Category, CategoryPayload, CategoryType};
use crate::state::AppState;

fn category_json(category: &Category) -> Value {
    json!({
        "id": category.id,
        "name": category.name,
        "type": category.category_type.as_str(),
        "type_label": category.category_type.label(),
        "emoji": category.emoji,
        "created_at": category.created_at,
    })
}

/// Validate a create/update payload, naming every missing field.
fn validated_payload(payload: &CategoryPayload) -> AppResult<(String, CategoryType)> {
    let mut missing = Vec::new();

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    if name.is_none() {
        missing.push("name".to_string());
    }

    let category_type = payload
        .category_type
        .as_deref()
        .and_then(CategoryType::parse);
    if category_type.is_none() {
        missing.push("type".to_string());
    }

    match (name, category_type) {
        (Some(name), Some(t)) => Ok((name.to_string(), t)),
        _ => Err(AppError::missing_fields(
            "Name and a valid type are required",
            missing,
        )),
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let filter_type = params.category_type.as_deref().and_then(CategoryType::parse);
    let categories = categories::list_categories(&conn, filter_type)?;

    Ok(Json(json!({
        "status": "success",
        "data": categories.iter().map(category_json).collect::<Vec<_>>(),
    })))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let category = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;
    let transaction_count = categories::transaction_count(&conn, id)?;

    let mut data = category_json(&category);
    data["transaction_count"] = json!(transaction_count);

    Ok(Json(json!({ "status": "success", "data": data })))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> AppResult<Json<Value>> {
    let (name, category_type) = validated_payload(&payload)?;
    let emoji = payload
        .emoji
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| category_type.default_emoji())
        .to_string();

    let conn = state.db.get()?;
    if categories::find_duplicate(&conn, &name, category_type, None)?.is_some() {
        return Err(AppError::validation(format!(
            "A {} category named \"{}\" already exists",
            category_type.as_str(),
            name
        )));
    }

    let id = categories::create_category(&conn, &name, category_type, &emoji)?;
    let category = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::Internal("Category missing after insert".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Category \"{}\" created", category.name),
        "data": category_json(&category),
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let existing = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

    let (name, category_type) = validated_payload(&payload)?;
    let emoji = payload
        .emoji
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(existing.emoji.as_str())
        .to_string();

    if categories::find_duplicate(&conn, &name, category_type, Some(id))?.is_some() {
        return Err(AppError::validation(format!(
            "A {} category named \"{}\" already exists",
            category_type.as_str(),
            name
        )));
    }

    categories::update_category(&conn, id, &name, category_type, &emoji)?;
    let category = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::Internal("Category missing after update".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Category \"{}\" updated", category.name),
        "data": category_json(&category),
    })))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let category = categories::get_category(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

    let count = categories::transaction_count(&conn, id)?;
    if count > 0 {
        return Err(AppError::validation(format!(
            "Cannot delete category \"{}\". It has {} associated transaction(s). \
             Please reassign or delete those transactions first.",
            category.name, count
        )));
    }

    categories::delete_category(&conn, id)?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Category \"{}\" deleted", category.name),
    })))
}

/// Category counts plus income/expense totals for the resolved time filter.
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<Value>> {
    let filter = FilterState::from_params(&params);
    let range = filter.date_range(chrono::Local::now().date_naive());

    let conn = state.db.get()?;
    let (income_count, expense_count) = categories::type_counts(&conn)?;
    let (income_cents, expense_cents, _) = transactions::period_totals(&conn, range)?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "income_categories": income_count,
            "expense_categories": expense_count,
            "total_categories": income_count + expense_count,
            "period": filter.display_name(),
            "total_income": cents_to_amount(income_cents),
            "total_expenses": cents_to_amount(expense_cents),
            "net": cents_to_amount(income_cents - expense_cents),
            "formatted_income": format_currency(income_cents),
            "formatted_expenses": format_currency(expense_cents),
        },
    })))
}

/// Top expense categories as a bubble-chart series. `has_data` is false when
/// nothing was spent in the period.
pub async fn top_expenses(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<Value>> {
    let filter = FilterState::from_params(&params);
    let range = filter.date_range(chrono::Local::now().date_naive());

    let conn = state.db.get()?;
    let top = categories::top_expense_categories(&conn, range, TOP_CATEGORIES_LIMIT)?;
    let total: i64 = top.iter().map(|(_, cents)| cents).sum();

    if top.is_empty() || total <= 0 {
        return Ok(Json(json!({
            "status": "success",
            "has_data": false,
            "data": {
                "labels": [],
                "data": [],
                "emojis": [],
                "colors": [],
                "percentages": [],
                "bubbles": [],
            },
        })));
    }

    let amounts: Vec<i64> = top.iter().map(|(_, cents)| *cents).collect();
    let labels: Vec<&str> = top.iter().map(|(c, _)| c.name.as_str()).collect();
    let emojis: Vec<&str> = top.iter().map(|(c, _)| c.emoji.as_str()).collect();
    let colors: Vec<String> = (0..top.len()).map(|i| series_color(None, i)).collect();
    let percentages: Vec<f64> = amounts.iter().map(|&a| percentage(a, total)).collect();
    let data: Vec<f64> = amounts.iter().map(|&a| cents_to_amount(a)).collect();
    let bubbles = bubble_layout(&amounts);

    Ok(Json(json!({
        "status": "success",
        "has_data": true,
        "data": {
            "labels": labels,
            "data": data,
            "emojis": emojis,
            "colors": colors,
            "percentages": percentages,
            "bubbles": bubbles,
            "total": cents_to_amount(total),
            "formatted_total": format_currency(total),
            "period": filter.display_name(),
        },
    })))
}
