//! Integration tests for account CRUD and the account chart endpoint.

mod common;

use axum::http::StatusCode;
use common::TestClient;
use serde_json::json;

#[tokio::test]
async fn test_create_account_returns_formatted_balance() {
    let client = TestClient::new();

    let (status, body) = client
        .post_json(
            "/account/api/accounts",
            &json!({ "name": "Checking", "balance": 1234.56 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["name"], "Checking");
    assert_eq!(body["data"]["balance"], 1234.56);
    assert_eq!(body["data"]["formatted_balance"], "$1,234.56");
}

#[tokio::test]
async fn test_create_account_without_name_names_the_field() {
    let client = TestClient::new();

    let (status, body) = client
        .post_json("/account/api/accounts", &json!({ "balance": 10.0 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["fields"][0], "name");
}

#[tokio::test]
async fn test_duplicate_account_name_rejected() {
    let client = TestClient::new();
    client.create_account("Savings", 0.0).await;

    let (status, body) = client
        .post_json("/account/api/accounts", &json!({ "name": "Savings" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn test_opening_balance_booked_as_transaction() {
    let client = TestClient::new();
    let id = client.create_account("Checking", 500.0).await;

    // The opening balance shows up as a real income transaction.
    let (status, body) = client
        .get_json(&format!("/account/api/accounts/{}", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transaction_count"], 1);
    assert_eq!(body["data"]["balance"], 500.0);
}

#[tokio::test]
async fn test_account_detail_is_side_effect_free() {
    let client = TestClient::new();
    let id = client.create_account("Checking", 250.0).await;

    let first = client.account_balance(id).await;
    let second = client.account_balance(id).await;
    assert_eq!(first, second);
    assert_eq!(first, 250.0);
}

#[tokio::test]
async fn test_update_account_rename() {
    let client = TestClient::new();
    let id = client.create_account("Checking", 0.0).await;

    let (status, body) = client
        .put_json(
            &format!("/account/api/accounts/{}", id),
            &json!({ "name": "Main Checking" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Main Checking");
}

#[tokio::test]
async fn test_balance_edit_books_adjustment() {
    let client = TestClient::new();
    let id = client.create_account("Checking", 100.0).await;

    let (status, _) = client
        .put_json(
            &format!("/account/api/accounts/{}", id),
            &json!({ "balance": 160.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(client.account_balance(id).await, 160.0);

    // Initial deposit plus the adjustment entry.
    let (_, body) = client
        .get_json(&format!("/account/api/accounts/{}", id))
        .await;
    assert_eq!(body["data"]["transaction_count"], 2);
}

#[tokio::test]
async fn test_negative_balance_edit_rejected() {
    let client = TestClient::new();
    let id = client.create_account("Checking", 100.0).await;

    let (status, body) = client
        .put_json(
            &format!("/account/api/accounts/{}", id),
            &json!({ "balance": -5.0 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Balance cannot be negative");
}

#[tokio::test]
async fn test_delete_account_with_transactions_blocked() {
    let client = TestClient::new();
    let id = client.create_account("Checking", 500.0).await;

    let (status, body) = client
        .delete(&format!("/account/api/accounts/{}", id))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Cannot delete account \"Checking\""));
    assert!(message.contains("1 associated transaction(s)"));
}

#[tokio::test]
async fn test_delete_empty_account() {
    let client = TestClient::new();
    let id = client.create_account("Scratch", 0.0).await;

    let (status, body) = client
        .delete(&format!("/account/api/accounts/{}", id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Account \"Scratch\" deleted");

    let (status, _) = client
        .get_json(&format!("/account/api/accounts/{}", id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_list_totals() {
    let client = TestClient::new();
    client.create_account("Checking", 100.0).await;
    client.create_account("Savings", 250.0).await;

    let (status, body) = client.get_json("/account/api/accounts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["accounts"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_balance"], 350.0);
    assert_eq!(body["data"]["formatted_total_balance"], "$350.00");
}

#[tokio::test]
async fn test_chart_data_skips_empty_accounts() {
    let client = TestClient::new();
    client.create_account("Checking", 100.0).await;
    client.create_account("Empty", 0.0).await;

    let (status, body) = client.get_json("/account/api/chart-data").await;
    assert_eq!(status, StatusCode::OK);

    let labels = body["data"]["labels"].as_array().unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0], "Checking");
    assert_eq!(
        body["data"]["backgroundColor"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_unknown_account_returns_404() {
    let client = TestClient::new();

    let (status, body) = client.get_json("/account/api/accounts/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}
