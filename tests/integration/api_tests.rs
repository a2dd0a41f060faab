//! API integration tests
//!
//! Expect a server on localhost:8080 with a fresh database.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

/// Helper to create a book with a unique ISBN
async fn create_book(client: &Client, isbn: &str) -> Value {
    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .json(&json!({
            "title": "1984",
            "author": "George Orwell",
            "isbn": isbn,
            "price": 10.99,
            "quantity": 25
        }))
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse create response")
}

fn unique_isbn(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("{}-{}", tag, nanos)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "UP");
}

#[tokio::test]
#[ignore]
async fn test_home() {
    let client = Client::new();

    let response = client
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "running");
    assert!(body["timestamp"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_and_duplicate_isbn() {
    let client = Client::new();
    let isbn = unique_isbn("dup");

    let created = create_book(&client, &isbn).await;
    assert!(created["id"].is_number());
    assert_eq!(created["title"], "1984");

    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .json(&json!({ "title": "Copy", "author": "Someone", "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap_or_default().contains("already exists"));
}

#[tokio::test]
#[ignore]
async fn test_patch_then_delete() {
    let client = Client::new();
    let created = create_book(&client, &unique_isbn("patch")).await;
    let url = format!("{}/api/books/{}", BASE_URL, created["id"]);

    let response = client
        .patch(&url)
        .json(&json!({ "quantity": 3 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["quantity"], 3);
    assert_eq!(body["title"], "1984");

    let response = client.delete(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client.get(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_get_missing_book() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/books/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
