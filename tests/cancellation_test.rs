mod common;

use bigdecimal::BigDecimal;
use reqwest::StatusCode;
use std::str::FromStr;

use common::spawn_app;

#[tokio::test]
async fn pending_sale_can_be_cancelled_without_changing_balances() {
    let mut app = spawn_app().await;
    let (_, token) = app.register_customer("buyer@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init = app.mock_initialize("C1", 20_000).await;

    let (sale_id, _) = app.initiate_sale(&token, product_id, 2, None).await;

    let res = app
        .client
        .patch(app.api(&format!("/sales/{}/cancel", sale_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Sale cancelled successfully");

    let (paid, balance, status) = app.sale_row(sale_id).await;
    assert_eq!(paid, BigDecimal::from(0));
    assert_eq!(balance, BigDecimal::from_str("200.00").unwrap());
    assert_eq!(status, "cancelled");
}

#[tokio::test]
async fn completed_sale_cannot_be_cancelled() {
    let mut app = spawn_app().await;
    let (_, token) = app.register_customer("buyer@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init = app.mock_initialize("C1", 20_000).await;
    let _confirm = app.mock_confirm("C1", "success", 20_000).await;

    let (sale_id, reference) = app.initiate_sale(&token, product_id, 2, None).await;

    app.client
        .get(app.api(&format!("/sales/verify/{}", reference)))
        .send()
        .await
        .unwrap();

    let res = app
        .client
        .patch(app.api(&format!("/sales/{}/cancel", sale_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Completed sales cannot be cancelled");

    let (_, _, status) = app.sale_row(sale_id).await;
    assert_eq!(status, "completed");
}

#[tokio::test]
async fn cancelling_another_customers_sale_is_forbidden() {
    let mut app = spawn_app().await;
    let (_, token) = app.register_customer("buyer@example.com").await;
    let (_, other_token) = app.register_customer("other@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init = app.mock_initialize("C1", 20_000).await;

    let (sale_id, _) = app.initiate_sale(&token, product_id, 2, None).await;

    let res = app
        .client
        .patch(app.api(&format!("/sales/{}/cancel", sale_id)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let (_, _, status) = app.sale_row(sale_id).await;
    assert_eq!(status, "pending");
}

#[tokio::test]
async fn confirmed_payment_against_a_cancelled_sale_is_a_reconciliation_anomaly() {
    let mut app = spawn_app().await;
    let (_, token) = app.register_customer("buyer@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init = app.mock_initialize("C1", 20_000).await;
    let _confirm = app.mock_confirm("C1", "success", 20_000).await;

    let (sale_id, reference) = app.initiate_sale(&token, product_id, 2, None).await;

    // Cancel before the webhook lands.
    let res = app
        .client
        .patch(app.api(&format!("/sales/{}/cancel", sale_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The gateway still confirms success: money moved for a dead sale.
    let res = app
        .client
        .get(app.api(&format!("/sales/verify/{}", reference)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    // The sale stays cancelled and untouched; the payment stays pending
    // for manual review, not silently applied or dropped.
    let (paid, _, status) = app.sale_row(sale_id).await;
    assert_eq!(paid, BigDecimal::from(0));
    assert_eq!(status, "cancelled");
    assert_eq!(app.payment_status(&reference).await, "pending");

    let (stock, sales_count) = app.product_stock(product_id).await;
    assert_eq!(stock, 5);
    assert_eq!(sales_count, 0);
}

#[tokio::test]
async fn staff_can_cancel_a_customers_pending_sale() {
    let mut app = spawn_app().await;
    let (_, token) = app.register_customer("buyer@example.com").await;
    let staff_token = app.register_staff("staff@example.com").await;
    let product_id = app.seed_product("100.00", 5).await;

    let _init = app.mock_initialize("C1", 20_000).await;

    let (sale_id, _) = app.initiate_sale(&token, product_id, 2, None).await;

    let res = app
        .client
        .patch(app.api(&format!("/sales/{}/cancel", sale_id)))
        .bearer_auth(&staff_token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);

    let (_, _, status) = app.sale_row(sale_id).await;
    assert_eq!(status, "cancelled");
}
