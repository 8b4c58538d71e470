//! Product and category data access. Plain create/read services; the only
//! non-trivial rule here is the category reparent cycle check, which runs
//! against an in-memory arena snapshot of the rows.

use bigdecimal::BigDecimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{ActorType, AuthUser};
use crate::db::models::{Category, Product};
use crate::db::queries;
use crate::domain::category::{CategoryArena, CategoryNode, CategoryTreeNode};
use crate::error::AppError;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
    pub category_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilters {
    pub category_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e.as_database_error().map(|d| d.kind()),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn arena(&self) -> Result<CategoryArena, AppError> {
        let rows = queries::list_categories(&self.pool).await?;
        Ok(CategoryArena::from_nodes(rows.into_iter().map(|c| {
            CategoryNode {
                id: c.id,
                name: c.name,
                parent_id: c.parent_id,
            }
        })))
    }

    pub async fn create_product(
        &self,
        actor: &AuthUser,
        new_product: NewProduct,
    ) -> Result<Product, AppError> {
        if actor.actor != ActorType::Vendor {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let vendor = queries::get_vendor(&self.pool, actor.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))?;

        if !vendor.is_verified {
            return Err(AppError::Forbidden(
                "Your vendor account is not verified. Please wait for admin approval.".to_string(),
            ));
        }

        let name = validation::sanitize_string(&new_product.name);
        validation::validate_required("name", &name)
            .and_then(|_| validation::validate_max_len("name", &name, validation::NAME_MAX_LEN))
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validation::validate_positive_amount("price", &new_product.price)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if new_product.quantity < 0 {
            return Err(AppError::Validation(
                "quantity: must not be negative".to_string(),
            ));
        }

        if queries::get_category(&self.pool, new_product.category_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        let now = chrono::Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name,
            description: new_product.description,
            quantity: new_product.quantity,
            price: new_product.price,
            vendor_id: vendor.id,
            category_id: new_product.category_id,
            view_count: 0,
            sales_count: 0,
            created_at: now,
            updated_at: now,
        };

        Ok(queries::insert_product(&self.pool, &product).await?)
    }

    /// Listing by category includes the whole subtree under it, resolved
    /// through the arena rather than recursive SQL.
    pub async fn list_products(
        &self,
        filters: ProductFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, AppError> {
        let category_ids = match filters.category_id {
            Some(id) => {
                let arena = self.arena().await?;
                if arena.get(id).is_none() {
                    return Err(AppError::NotFound("Category not found".to_string()));
                }
                Some(arena.subtree(id))
            }
            None => None,
        };

        Ok(queries::list_products(
            &self.pool,
            category_ids.as_deref(),
            filters.vendor_id,
            filters.search.as_deref(),
            limit,
            offset,
        )
        .await?)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        let product = queries::get_product(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        queries::bump_view_count(&self.pool, id).await?;

        Ok(product)
    }

    pub async fn create_category(
        &self,
        actor: &AuthUser,
        name: String,
        parent_id: Option<Uuid>,
    ) -> Result<Category, AppError> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let name = validation::sanitize_string(&name);
        validation::validate_required("name", &name)
            .and_then(|_| validation::validate_max_len("name", &name, validation::NAME_MAX_LEN))
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(parent) = parent_id {
            if queries::get_category(&self.pool, parent).await?.is_none() {
                return Err(AppError::NotFound("Parent category not found".to_string()));
            }
        }

        let now = chrono::Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name,
            parent_id,
            created_at: now,
            updated_at: now,
        };

        queries::insert_category(&self.pool, &category)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::BusinessRule("Category name already exists".to_string())
                } else {
                    e.into()
                }
            })
    }

    pub async fn update_category(
        &self,
        actor: &AuthUser,
        id: Uuid,
        update: CategoryUpdate,
    ) -> Result<Category, AppError> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let current = queries::get_category(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let new_parent = match update.parent_id {
            Some(candidate) => {
                let arena = self.arena().await?;
                arena
                    .check_reparent(id, candidate)
                    .map_err(|e| AppError::BusinessRule(e.message().to_string()))?;
                Some(candidate)
            }
            None => current.parent_id,
        };

        let new_name = match update.name {
            Some(name) => {
                let name = validation::sanitize_string(&name);
                validation::validate_required("name", &name)
                    .and_then(|_| {
                        validation::validate_max_len("name", &name, validation::NAME_MAX_LEN)
                    })
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                name
            }
            None => current.name,
        };

        queries::update_category(&self.pool, id, &new_name, new_parent)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::BusinessRule("Category name already exists".to_string())
                } else {
                    e.into()
                }
            })
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(queries::list_categories(&self.pool).await?)
    }

    pub async fn category_tree(&self) -> Result<Vec<CategoryTreeNode>, AppError> {
        Ok(self.arena().await?.tree())
    }
}
