//! Integration tests for category CRUD, stats and the top-expenses chart.

mod common;

use axum::http::StatusCode;
use common::TestClient;
use serde_json::json;

#[tokio::test]
async fn test_create_category_defaults_emoji_by_type() {
    let client = TestClient::new();

    let (status, body) = client
        .post_json(
            "/categories/api/categories",
            &json!({ "name": "Salary", "type": "income" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "income");
    assert_eq!(body["data"]["emoji"], "\u{1f4b0}");

    let (_, body) = client
        .post_json(
            "/categories/api/categories",
            &json!({ "name": "Rent", "type": "expense" }),
        )
        .await;
    assert_eq!(body["data"]["emoji"], "\u{1f4b8}");
}

#[tokio::test]
async fn test_create_category_names_missing_fields() {
    let client = TestClient::new();

    let (status, body) = client
        .post_json("/categories/api/categories", &json!({}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["fields"].as_array().unwrap();
    assert!(fields.contains(&json!("name")));
    assert!(fields.contains(&json!("type")));
}

#[tokio::test]
async fn test_invalid_type_rejected() {
    let client = TestClient::new();

    let (status, body) = client
        .post_json(
            "/categories/api/categories",
            &json!({ "name": "Misc", "type": "savings" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0], "type");
}

#[tokio::test]
async fn test_duplicate_name_within_type_rejected() {
    let client = TestClient::new();
    client.create_category("Food", "expense").await;

    let (status, body) = client
        .post_json(
            "/categories/api/categories",
            &json!({ "name": "Food", "type": "expense" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));

    // Same name under the other type is allowed.
    let (status, _) = client
        .post_json(
            "/categories/api/categories",
            &json!({ "name": "Food", "type": "income" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_filters_by_type() {
    let client = TestClient::new();
    client.create_category("Salary", "income").await;
    client.create_category("Food", "expense").await;
    client.create_category("Rent", "expense").await;

    let (status, body) = client
        .get_json("/categories/api/categories?type=expense")
        .await;
    assert_eq!(status, StatusCode::OK);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|c| c["type"] == "expense"));
}

#[tokio::test]
async fn test_delete_category_success_envelope() {
    let client = TestClient::new();
    let id = client.create_category("Hobbies", "expense").await;

    let (status, body) = client
        .delete(&format!("/categories/api/categories/{}", id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Category \"Hobbies\" deleted");
}

#[tokio::test]
async fn test_delete_category_with_transactions_blocked() {
    let client = TestClient::new();
    let account = client.create_account("Checking", 0.0).await;
    let category = client.create_category("Food", "expense").await;
    client
        .create_transaction(12.50, "Lunch", account, category)
        .await;

    let (status, body) = client
        .delete(&format!("/categories/api/categories/{}", category))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Cannot delete category \"Food\""));
    assert!(message.contains("1 associated transaction(s)"));
    assert!(message.contains("reassign or delete"));
}

#[tokio::test]
async fn test_stats_counts_by_type() {
    let client = TestClient::new();
    client.create_category("Salary", "income").await;
    client.create_category("Food", "expense").await;
    client.create_category("Rent", "expense").await;

    let (status, body) = client.get_json("/categories/api/categories/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["income_categories"], 1);
    assert_eq!(body["data"]["expense_categories"], 2);
    assert_eq!(body["data"]["total_categories"], 3);
    assert_eq!(body["data"]["period"], "This Month");
}

#[tokio::test]
async fn test_top_expenses_empty_period() {
    let client = TestClient::new();

    let (status, body) = client
        .get_json("/categories/api/categories/top-expenses")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["has_data"], false);
    assert_eq!(body["data"]["labels"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["bubbles"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_top_expenses_percentages_and_bubbles() {
    let client = TestClient::new();
    let account = client.create_account("Checking", 0.0).await;
    let food = client.create_category("Food", "expense").await;
    let rent = client.create_category("Rent", "expense").await;

    client.create_transaction(12.0, "Groceries", account, food).await;
    client.create_transaction(88.0, "August rent", account, rent).await;

    let (status, body) = client
        .get_json("/categories/api/categories/top-expenses")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_data"], true);

    // Ordered by spend, largest first, shares with one decimal.
    assert_eq!(body["data"]["labels"][0], "Rent");
    assert_eq!(body["data"]["labels"][1], "Food");
    assert_eq!(body["data"]["percentages"][0], 88.0);
    assert_eq!(body["data"]["percentages"][1], 12.0);
    assert_eq!(body["data"]["total"], 100.0);

    let bubbles = body["data"]["bubbles"].as_array().unwrap();
    assert_eq!(bubbles.len(), 2);
    for bubble in bubbles {
        let r = bubble["r"].as_f64().unwrap();
        assert!((8.0..=26.0).contains(&r));
    }

    let colors = body["data"]["colors"].as_array().unwrap();
    assert_eq!(colors[0], "#FF6384");
    assert_eq!(colors[1], "#36A2EB");
}
