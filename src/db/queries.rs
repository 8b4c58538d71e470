use chrono::Utc;
use sqlx::{PgPool, Postgres, Result, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::models::{
    Category, Customer, CustomerAddress, KycRequest, KycRequestStatus, Payment, Product, Sale,
    User, Vendor,
};
use crate::domain::sale::{KycStatus, SaleStatus};

// --- Staff users ---

pub async fn insert_user(pool: &PgPool, user: &User) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, address, phone, email, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.address)
    .bind(&user.phone)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

// --- Vendors ---

pub async fn insert_vendor(pool: &PgPool, vendor: &Vendor) -> Result<Vendor> {
    sqlx::query_as::<_, Vendor>(
        r#"
        INSERT INTO vendors (
            id, name, business_name, address, phone, email, password_hash,
            is_verified, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(vendor.id)
    .bind(&vendor.name)
    .bind(&vendor.business_name)
    .bind(&vendor.address)
    .bind(&vendor.phone)
    .bind(&vendor.email)
    .bind(&vendor.password_hash)
    .bind(vendor.is_verified)
    .bind(vendor.created_at)
    .bind(vendor.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_vendor(pool: &PgPool, id: Uuid) -> Result<Option<Vendor>> {
    sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_vendor_by_email(pool: &PgPool, email: &str) -> Result<Option<Vendor>> {
    sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

// --- Customers ---

pub async fn insert_customer(pool: &PgPool, customer: &Customer) -> Result<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (id, name, phone, email, password_hash, kyc_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.email)
    .bind(&customer.password_hash)
    .bind(customer.kyc_status)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_customer(pool: &PgPool, id: Uuid) -> Result<Option<Customer>> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_customer_by_email(pool: &PgPool, email: &str) -> Result<Option<Customer>> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn set_customer_kyc_status(
    executor: &mut SqlxTransaction<'_, Postgres>,
    customer_id: Uuid,
    status: KycStatus,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE customers SET kyc_status = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(status)
    .bind(customer_id)
    .execute(&mut **executor)
    .await?;

    Ok(result.rows_affected())
}

// --- Customer addresses ---

pub async fn insert_address(pool: &PgPool, address: &CustomerAddress) -> Result<CustomerAddress> {
    sqlx::query_as::<_, CustomerAddress>(
        r#"
        INSERT INTO customer_addresses (
            id, customer_id, address, city, state, postal_code, is_default, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(address.id)
    .bind(address.customer_id)
    .bind(&address.address)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.postal_code)
    .bind(address.is_default)
    .bind(address.created_at)
    .bind(address.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_address(pool: &PgPool, id: Uuid) -> Result<Option<CustomerAddress>> {
    sqlx::query_as::<_, CustomerAddress>("SELECT * FROM customer_addresses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_addresses(pool: &PgPool, customer_id: Uuid) -> Result<Vec<CustomerAddress>> {
    sqlx::query_as::<_, CustomerAddress>(
        "SELECT * FROM customer_addresses WHERE customer_id = $1 ORDER BY created_at DESC",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await
}

pub async fn clear_default_addresses(pool: &PgPool, customer_id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE customer_addresses SET is_default = FALSE, updated_at = NOW() WHERE customer_id = $1 AND is_default",
    )
    .bind(customer_id)
    .execute(pool)
    .await?;

    Ok(())
}

// --- Categories ---

pub async fn insert_category(pool: &PgPool, category: &Category) -> Result<Category> {
    sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (id, name, parent_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(category.parent_id)
    .bind(category.created_at)
    .bind(category.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_category(pool: &PgPool, id: Uuid) -> Result<Option<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
        .fetch_all(pool)
        .await
}

pub async fn update_category(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    parent_id: Option<Uuid>,
) -> Result<Category> {
    sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories SET name = $1, parent_id = $2, updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(parent_id)
    .bind(id)
    .fetch_one(pool)
    .await
}

// --- Products ---

pub async fn insert_product(pool: &PgPool, product: &Product) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            id, name, description, quantity, price, vendor_id, category_id,
            view_count, sales_count, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.quantity)
    .bind(&product.price)
    .bind(product.vendor_id)
    .bind(product.category_id)
    .bind(product.view_count)
    .bind(product.sales_count)
    .bind(product.created_at)
    .bind(product.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_products(
    pool: &PgPool,
    category_ids: Option<&[Uuid]>,
    vendor_id: Option<Uuid>,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT * FROM products
        WHERE ($1::uuid[] IS NULL OR category_id = ANY($1))
          AND ($2::uuid IS NULL OR vendor_id = $2)
          AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(category_ids)
    .bind(vendor_id)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn bump_view_count(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE products SET view_count = view_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

// --- Sales ---

pub async fn insert_sale(pool: &PgPool, sale: &Sale) -> Result<Sale> {
    sqlx::query_as::<_, Sale>(
        r#"
        INSERT INTO sales (
            id, price, amount, paid, balance, quantity, customer_id, product_id,
            address_id, status, payment_reference, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(sale.id)
    .bind(&sale.price)
    .bind(&sale.amount)
    .bind(&sale.paid)
    .bind(&sale.balance)
    .bind(sale.quantity)
    .bind(sale.customer_id)
    .bind(sale.product_id)
    .bind(sale.address_id)
    .bind(sale.status)
    .bind(&sale.payment_reference)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .fetch_one(pool)
    .await
}

/// Removes a pending sale that never got a gateway charge. Only the
/// initiation rollback path uses this; applied sales are never deleted.
pub async fn delete_orphaned_sale(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM sales WHERE id = $1 AND status = 'pending' AND paid = 0")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn stamp_sale_reference(pool: &PgPool, id: Uuid, reference: &str) -> Result<()> {
    sqlx::query("UPDATE sales SET payment_reference = $1, updated_at = NOW() WHERE id = $2")
        .bind(reference)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_sale(pool: &PgPool, id: Uuid) -> Result<Option<Sale>> {
    sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Sale owned by the customer that can still take money.
pub async fn get_open_sale_for_customer(
    pool: &PgPool,
    id: Uuid,
    customer_id: Uuid,
) -> Result<Option<Sale>> {
    sqlx::query_as::<_, Sale>(
        r#"
        SELECT * FROM sales
        WHERE id = $1 AND customer_id = $2 AND status IN ('pending', 'partial')
        "#,
    )
    .bind(id)
    .bind(customer_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_sales(
    pool: &PgPool,
    status: Option<SaleStatus>,
    customer_id: Option<Uuid>,
    product_id: Option<Uuid>,
    vendor_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Sale>> {
    sqlx::query_as::<_, Sale>(
        r#"
        SELECT s.* FROM sales s
        JOIN products p ON p.id = s.product_id
        WHERE ($1::text IS NULL OR s.status = $1)
          AND ($2::uuid IS NULL OR s.customer_id = $2)
          AND ($3::uuid IS NULL OR s.product_id = $3)
          AND ($4::uuid IS NULL OR p.vendor_id = $4)
        ORDER BY s.created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(status)
    .bind(customer_id)
    .bind(product_id)
    .bind(vendor_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn cancel_sale(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE sales SET status = 'cancelled', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

// --- Payments ---

pub async fn insert_payment(pool: &PgPool, payment: &Payment) -> Result<Payment> {
    sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (
            id, sale_id, amount, payment_reference, status, payment_method, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(payment.id)
    .bind(payment.sale_id)
    .bind(&payment.amount)
    .bind(&payment.payment_reference)
    .bind(payment.status)
    .bind(&payment.payment_method)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_payment_by_reference(pool: &PgPool, reference: &str) -> Result<Option<Payment>> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE payment_reference = $1")
        .bind(reference)
        .fetch_optional(pool)
        .await
}

pub async fn list_payments_for_sale(pool: &PgPool, sale_id: Uuid) -> Result<Vec<Payment>> {
    sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE sale_id = $1 ORDER BY created_at ASC",
    )
    .bind(sale_id)
    .fetch_all(pool)
    .await
}

/// Terminal pending -> failed transition. The status guard keeps an
/// already-successful payment untouched.
pub async fn mark_payment_failed_if_pending(pool: &PgPool, reference: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE payments SET status = 'failed', updated_at = NOW() WHERE payment_reference = $1 AND status = 'pending'",
    )
    .bind(reference)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// --- Verification transaction (row-locked) ---
//
// The verify path locks the payment row first and the sale row second,
// always in that order. Concurrent verifies for the same reference
// serialize on the payment row; verifies for different references on the
// same sale serialize on the sale row.

pub async fn get_payment_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    reference: &str,
) -> Result<Option<Payment>> {
    sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE payment_reference = $1 FOR UPDATE",
    )
    .bind(reference)
    .fetch_optional(&mut **executor)
    .await
}

pub async fn mark_payment_success(
    executor: &mut SqlxTransaction<'_, Postgres>,
    reference: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE payments SET status = 'success', updated_at = NOW() WHERE payment_reference = $1",
    )
    .bind(reference)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

pub async fn get_sale_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Sale>> {
    sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **executor)
        .await
}

pub async fn apply_sale_payment(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    paid: &bigdecimal::BigDecimal,
    balance: &bigdecimal::BigDecimal,
    status: SaleStatus,
) -> Result<()> {
    sqlx::query(
        "UPDATE sales SET paid = $1, balance = $2, status = $3, updated_at = $4 WHERE id = $5",
    )
    .bind(paid)
    .bind(balance)
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

/// Relative stock adjustment; absolute writes would lose updates under
/// concurrent completions of the same product.
pub async fn adjust_product_inventory(
    executor: &mut SqlxTransaction<'_, Postgres>,
    product_id: Uuid,
    quantity_delta: i32,
    sales_count_delta: i32,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity + $1, sales_count = sales_count + $2, updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(quantity_delta)
    .bind(sales_count_delta)
    .bind(product_id)
    .execute(&mut **executor)
    .await?;

    Ok(result.rows_affected())
}

// --- KYC requests ---

pub async fn insert_kyc_request(pool: &PgPool, request: &KycRequest) -> Result<KycRequest> {
    sqlx::query_as::<_, KycRequest>(
        r#"
        INSERT INTO kyc_requests (id, customer_id, doc_ref, doc_type, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(request.id)
    .bind(request.customer_id)
    .bind(&request.doc_ref)
    .bind(&request.doc_type)
    .bind(request.status)
    .bind(request.created_at)
    .bind(request.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_kyc_request(pool: &PgPool, id: Uuid) -> Result<Option<KycRequest>> {
    sqlx::query_as::<_, KycRequest>("SELECT * FROM kyc_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_kyc_request_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<KycRequest>> {
    sqlx::query_as::<_, KycRequest>("SELECT * FROM kyc_requests WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **executor)
        .await
}

pub async fn list_kyc_requests(
    pool: &PgPool,
    status: Option<KycRequestStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<KycRequest>> {
    sqlx::query_as::<_, KycRequest>(
        r#"
        SELECT * FROM kyc_requests
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn update_kyc_request_status(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    status: KycRequestStatus,
) -> Result<()> {
    sqlx::query("UPDATE kyc_requests SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(&mut **executor)
        .await?;

    Ok(())
}
