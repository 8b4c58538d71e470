mod common;

use bigdecimal::BigDecimal;
use reqwest::StatusCode;
use serde_json::json;
use std::str::FromStr;

use common::spawn_app;

#[tokio::test]
async fn unverified_customer_cannot_pay_partially() {
    let mut app = spawn_app().await;
    let (_, token) = app.register_customer("buyer@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init = app.mock_initialize("P1", 4_000).await;

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
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Part payment is only available for verified customers"
    );
}

#[tokio::test]
async fn partial_payment_below_thirty_percent_is_rejected() {
    let mut app = spawn_app().await;
    let (customer_id, token) = app.register_customer("buyer@example.com").await;
    app.set_customer_verified(customer_id).await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init = app.mock_initialize("P1", 2_000).await;

    let res = app
        .client
        .post(app.api("/sales/initialize"))
        .bearer_auth(&token)
        .json(&json!({
            "product_id": product_id,
            "quantity": 1,
            "partial_amount": "20.00",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Minimum partial payment is 30% of total amount");
}

#[tokio::test]
async fn partial_then_additional_payment_completes_the_sale() {
    let mut app = spawn_app().await;
    let (customer_id, token) = app.register_customer("buyer@example.com").await;
    app.set_customer_verified(customer_id).await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init_partial = app.mock_initialize("P1", 4_000).await;
    let _confirm_partial = app.mock_confirm("P1", "success", 4_000).await;

    let (sale_id, reference) = app
        .initiate_sale(&token, product_id, 1, Some("40.00"))
        .await;
    assert_eq!(reference, "P1");

    let res = app
        .client
        .get(app.api(&format!("/sales/verify/{}", reference)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["status"], "partial");
    assert_eq!(body["data"]["paid"], "40.00");
    assert_eq!(body["data"]["balance"], "60.00");

    // Nothing ships yet.
    let (stock, sales_count) = app.product_stock(product_id).await;
    assert_eq!(stock, 5);
    assert_eq!(sales_count, 0);

    let _init_rest = app.mock_initialize("P2", 6_000).await;
    let _confirm_rest = app.mock_confirm("P2", "success", 6_000).await;

    let res = app
        .client
        .post(app.api("/sales/additional-payment"))
        .bearer_auth(&token)
        .json(&json!({"sale_id": sale_id, "amount": "60.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let second_reference = body["data"]["reference"].as_str().unwrap().to_string();
    assert_eq!(second_reference, "P2");

    // The sale does not change until the new reference is verified.
    let (paid, _, status) = app.sale_row(sale_id).await;
    assert_eq!(paid, BigDecimal::from_str("40.00").unwrap());
    assert_eq!(status, "partial");

    let res = app
        .client
        .get(app.api(&format!("/sales/verify/{}", second_reference)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["status"], "completed");

    let (paid, balance, status) = app.sale_row(sale_id).await;
    assert_eq!(paid, BigDecimal::from_str("100.00").unwrap());
    assert_eq!(balance, BigDecimal::from(0));
    assert_eq!(status, "completed");

    let (stock, sales_count) = app.product_stock(product_id).await;
    assert_eq!(stock, 4);
    assert_eq!(sales_count, 1);
}

#[tokio::test]
async fn additional_payment_above_balance_is_rejected_and_creates_no_payment() {
    let mut app = spawn_app().await;
    let (customer_id, token) = app.register_customer("buyer@example.com").await;
    app.set_customer_verified(customer_id).await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init_partial = app.mock_initialize("P1", 4_000).await;
    let _confirm_partial = app.mock_confirm("P1", "success", 4_000).await;

    let (sale_id, reference) = app
        .initiate_sale(&token, product_id, 1, Some("40.00"))
        .await;

    app.client
        .get(app.api(&format!("/sales/verify/{}", reference)))
        .send()
        .await
        .unwrap();

    let res = app
        .client
        .post(app.api("/sales/additional-payment"))
        .bearer_auth(&token)
        .json(&json!({"sale_id": sale_id, "amount": "80.00"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Payment amount exceeds remaining balance");

    let payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE sale_id = $1")
        .bind(sale_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(payments, 1);
}

#[tokio::test]
async fn additional_payment_on_someone_elses_sale_is_not_found() {
    let mut app = spawn_app().await;
    let (customer_id, token) = app.register_customer("buyer@example.com").await;
    app.set_customer_verified(customer_id).await;
    let (_, other_token) = app.register_customer("other@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init_partial = app.mock_initialize("P1", 4_000).await;
    let _confirm_partial = app.mock_confirm("P1", "success", 4_000).await;

    let (sale_id, reference) = app
        .initiate_sale(&token, product_id, 1, Some("40.00"))
        .await;

    app.client
        .get(app.api(&format!("/sales/verify/{}", reference)))
        .send()
        .await
        .unwrap();

    let res = app
        .client
        .post(app.api("/sales/additional-payment"))
        .bearer_auth(&other_token)
        .json(&json!({"sale_id": sale_id, "amount": "10.00"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Sale not found or already completed");
}
