pub mod accounts;
pub mod categories;
pub mod dashboard;
pub mod transactions;
pub mod transfers;

use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/account/api/accounts", get(accounts::list).post(accounts::create))
        .route("/account/api/accounts/:id", get(accounts::show))
        .route("/account/api/accounts/:id", put(accounts::update))
        .route("/account/api/accounts/:id", delete(accounts::delete))
        .route("/account/api/chart-data", get(accounts::chart_data))
        // Transfers
        .route("/account/api/transfers", get(transfers::list).post(transfers::create))
        .route("/account/api/transfers/:id", get(transfers::show))
        .route("/account/api/transfers/:id/reverse", post(transfers::reverse))
        .route("/account/api/transfer-options", get(transfers::options))
        .route("/account/api/recent-transfers", get(transfers::recent))
        .route("/account/api/transfer-summary", get(transfers::summary))
        // Categories
        .route(
            "/categories/api/categories",
            get(categories::list).post(categories::create),
        )
        .route("/categories/api/categories/:id", get(categories::show))
        .route("/categories/api/categories/:id", put(categories::update))
        .route("/categories/api/categories/:id", delete(categories::delete))
        .route("/categories/api/categories/stats", get(categories::stats))
        .route(
            "/categories/api/categories/top-expenses",
            get(categories::top_expenses),
        )
        // Transactions
        .route(
            "/transactions/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/api/transactions/:id", get(transactions::show))
        .route("/transactions/api/transactions/:id", put(transactions::update))
        .route(
            "/transactions/api/transactions/:id",
            delete(transactions::delete),
        )
        .route(
            "/transactions/api/transactions/bulk",
            post(transactions::bulk_delete),
        )
        .route("/transactions/api/statistics", get(transactions::statistics))
        .route("/transactions/api/descriptions", get(transactions::descriptions))
        .route("/transactions/export/csv", get(transactions::export_csv))
        // Dashboard
        .route("/home/api/stats", get(dashboard::stats))
        .route("/home/api/recent-transactions", get(dashboard::recent_transactions))
        .route("/home/api/category-breakdown", get(dashboard::category_breakdown))
        .route("/home/api/monthly-trend", get(dashboard::monthly_trend))
        .route("/home/api/daily-activity", get(dashboard::daily_activity))
        // Session plumbing
        .route("/api/csrf-token", get(csrf_token))
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}

/// Token the client echoes back in the `X-CSRFToken` header on mutations.
async fn csrf_token(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": { "csrf_token": state.csrf_token.value() },
    }))
}
