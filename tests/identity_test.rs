mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn customer_can_register_and_log_in() {
    let app = spawn_app().await;
    let (_, _) = app.register_customer("jane@example.com").await;

    let res = app
        .client
        .post(app.api("/customers/login"))
        .json(&json!({"email": "jane@example.com", "password": "correct-horse-battery"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "jane@example.com");
    assert_eq!(body["data"]["kyc_status"], "pending");
    assert!(body["data"]["token"].as_str().is_some());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    let (_, _) = app.register_customer("jane@example.com").await;

    let res = app
        .client
        .post(app.api("/customers/login"))
        .json(&json!({"email": "jane@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn duplicate_email_registration_is_rejected() {
    let app = spawn_app().await;
    let (_, _) = app.register_customer("jane@example.com").await;

    let res = app
        .client
        .post(app.api("/customers/register"))
        .json(&json!({
            "name": "Jane Again",
            "phone": "08000000001",
            "email": "jane@example.com",
            "password": "another-password",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = spawn_app().await;
    let (_, token) = app.register_customer("jane@example.com").await;

    let res = app
        .client
        .get(app.api("/customers/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.client.get(app.api("/customers/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .client
        .get(app.api("/customers/me"))
        .bearer_auth("garbage-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn kyc_approval_unlocks_partial_payments() {
    let mut app = spawn_app().await;
    let (_, token) = app.register_customer("jane@example.com").await;
    let staff_token = app.register_staff("staff@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    // Partial payment is gated while unverified.
    let res = app
        .client
        .post(app.api("/sales/initialize"))
        .bearer_auth(&token)
        .json(&json!({
            "product_id": product_id,
            "quantity": 1,
            "partial_amount": "40.00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Submit a document and have staff approve it.
    let res = app
        .client
        .post(app.api("/kyc"))
        .bearer_auth(&token)
        .json(&json!({"doc_ref": "document-vault/abc123", "doc_type": "passport"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let request_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending");

    let res = app
        .client
        .patch(app.api(&format!("/kyc/{}/review", request_id)))
        .bearer_auth(&staff_token)
        .json(&json!({"decision": "approve"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["status"], "approved");

    // The same partial payment now passes the gate.
    let _init = app.mock_initialize("K1", 4_000).await;
    let res = app
        .client
        .post(app.api("/sales/initialize"))
        .bearer_auth(&token)
        .json(&json!({
            "product_id": product_id,
            "quantity": 1,
            "partial_amount": "40.00",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn kyc_review_is_staff_only_and_single_shot() {
    let app = spawn_app().await;
    let (_, token) = app.register_customer("jane@example.com").await;
    let staff_token = app.register_staff("staff@example.com").await;

    let res = app
        .client
        .post(app.api("/kyc"))
        .bearer_auth(&token)
        .json(&json!({"doc_ref": "document-vault/abc123"}))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    // Customers cannot review.
    let res = app
        .client
        .patch(app.api(&format!("/kyc/{}/review", request_id)))
        .bearer_auth(&token)
        .json(&json!({"decision": "approve"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // First review lands, the second is rejected.
    let res = app
        .client
        .patch(app.api(&format!("/kyc/{}/review", request_id)))
        .bearer_auth(&staff_token)
        .json(&json!({"decision": "reject"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .client
        .patch(app.api(&format!("/kyc/{}/review", request_id)))
        .bearer_auth(&staff_token)
        .json(&json!({"decision": "approve"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "KYC request has already been reviewed");
}
