pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;
pub mod validation;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::gateway::PaymentGateway;
use crate::services::catalog::CatalogService;
use crate::services::customers::CustomerService;
use crate::services::kyc::KycService;
use crate::services::sales::SaleService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: TokenIssuer,
    pub sales: SaleService,
    pub catalog: CatalogService,
    pub customers: CustomerService,
    pub kyc: KycService,
}

impl AppState {
    pub fn new(db: PgPool, gateway: Arc<dyn PaymentGateway>, tokens: TokenIssuer) -> Self {
        Self {
            sales: SaleService::new(db.clone(), gateway),
            catalog: CatalogService::new(db.clone()),
            customers: CustomerService::new(db.clone()),
            kyc: KycService::new(db.clone()),
            tokens,
            db,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        // Sales: the payment/settlement core
        .route("/sales/initialize", post(handlers::sales::initialize))
        .route("/sales/verify/:reference", get(handlers::sales::verify))
        .route(
            "/sales/additional-payment",
            post(handlers::sales::additional_payment),
        )
        .route("/sales", get(handlers::sales::list))
        .route("/sales/:id", get(handlers::sales::get))
        .route("/sales/:id/cancel", patch(handlers::sales::cancel))
        // Identities
        .route(
            "/customers/register",
            post(handlers::auth::register_customer),
        )
        .route("/customers/login", post(handlers::auth::login_customer))
        .route("/customers/me", get(handlers::customers::me))
        .route(
            "/customers/addresses",
            get(handlers::customers::list_addresses).post(handlers::customers::add_address),
        )
        .route("/vendors/register", post(handlers::auth::register_vendor))
        .route("/vendors/login", post(handlers::auth::login_vendor))
        .route("/users/register", post(handlers::auth::register_user))
        .route("/users/login", post(handlers::auth::login_user))
        // Catalog
        .route(
            "/products",
            get(handlers::products::list).post(handlers::products::create),
        )
        .route("/products/:id", get(handlers::products::get))
        .route(
            "/categories",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route("/categories/tree", get(handlers::categories::tree))
        .route("/categories/:id", patch(handlers::categories::update))
        // KYC workflow
        .route(
            "/kyc",
            get(handlers::kyc::list).post(handlers::kyc::submit),
        )
        .route("/kyc/:id/review", patch(handlers::kyc::review))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .with_state(state)
}
