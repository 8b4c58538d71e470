//! Identity registration, login, and customer profile data. Passwords are
//! hashed through the explicit credentials module at registration time and
//! verified the same way at login; rows never carry plaintext.

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::credentials::{self, Password, PasswordDigest};
use crate::db::models::{Customer, CustomerAddress, StaffRole, User, Vendor};
use crate::db::queries;
use crate::domain::sale::KycStatus;
use crate::error::AppError;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct RegisterCustomer {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterVendor {
    pub name: String,
    pub business_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub address: Option<String>,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub role: Option<StaffRole>,
}

#[derive(Debug, Deserialize)]
pub struct NewAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

fn check_identity_fields(name: &str, phone: &str, email: &str, password: &str) -> Result<(), AppError> {
    validation::validate_required("name", name)
        .and_then(|_| validation::validate_max_len("name", name, validation::NAME_MAX_LEN))
        .and_then(|_| validation::validate_required("phone", phone))
        .and_then(|_| validation::validate_email("email", email))
        .and_then(|_| validation::validate_password("password", password))
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn hash_password(password: String) -> Result<PasswordDigest, AppError> {
    credentials::hash(&Password::new(password))
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

#[derive(Clone)]
pub struct CustomerService {
    pool: PgPool,
}

impl CustomerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register_customer(&self, req: RegisterCustomer) -> Result<Customer, AppError> {
        check_identity_fields(&req.name, &req.phone, &req.email, &req.password)?;

        let email = validation::sanitize_string(&req.email).to_lowercase();
        if queries::get_customer_by_email(&self.pool, &email)
            .await?
            .is_some()
        {
            return Err(AppError::BusinessRule("Email already registered".to_string()));
        }

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: validation::sanitize_string(&req.name),
            phone: validation::sanitize_string(&req.phone),
            email,
            password_hash: hash_password(req.password)?.into_string(),
            kyc_status: KycStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let created = queries::insert_customer(&self.pool, &customer).await?;
        tracing::info!(customer_id = %created.id, "customer registered");
        Ok(created)
    }

    pub async fn login_customer(&self, email: &str, password: &str) -> Result<Customer, AppError> {
        let email = validation::sanitize_string(email).to_lowercase();
        let customer = queries::get_customer_by_email(&self.pool, &email).await?;

        match customer {
            Some(c)
                if credentials::verify(
                    &Password::new(password.to_string()),
                    &PasswordDigest::from_stored(c.password_hash.clone()),
                ) =>
            {
                Ok(c)
            }
            _ => Err(AppError::Unauthorized("Invalid credentials".to_string())),
        }
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        queries::get_customer(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
    }

    pub async fn register_vendor(&self, req: RegisterVendor) -> Result<Vendor, AppError> {
        check_identity_fields(&req.name, &req.phone, &req.email, &req.password)?;
        validation::validate_required("business_name", &req.business_name)
            .and_then(|_| validation::validate_required("address", &req.address))
            .and_then(|_| {
                validation::validate_max_len("address", &req.address, validation::ADDRESS_MAX_LEN)
            })
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let email = validation::sanitize_string(&req.email).to_lowercase();
        if queries::get_vendor_by_email(&self.pool, &email)
            .await?
            .is_some()
        {
            return Err(AppError::BusinessRule("Email already registered".to_string()));
        }

        let now = Utc::now();
        let vendor = Vendor {
            id: Uuid::new_v4(),
            name: validation::sanitize_string(&req.name),
            business_name: validation::sanitize_string(&req.business_name),
            address: req.address,
            phone: validation::sanitize_string(&req.phone),
            email,
            password_hash: hash_password(req.password)?.into_string(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        let created = queries::insert_vendor(&self.pool, &vendor).await?;
        tracing::info!(vendor_id = %created.id, "vendor registered");
        Ok(created)
    }

    pub async fn login_vendor(&self, email: &str, password: &str) -> Result<Vendor, AppError> {
        let email = validation::sanitize_string(email).to_lowercase();
        let vendor = queries::get_vendor_by_email(&self.pool, &email).await?;

        match vendor {
            Some(v)
                if credentials::verify(
                    &Password::new(password.to_string()),
                    &PasswordDigest::from_stored(v.password_hash.clone()),
                ) =>
            {
                Ok(v)
            }
            _ => Err(AppError::Unauthorized("Invalid credentials".to_string())),
        }
    }

    pub async fn register_user(&self, req: RegisterUser) -> Result<User, AppError> {
        check_identity_fields(&req.name, &req.phone, &req.email, &req.password)?;

        let email = validation::sanitize_string(&req.email).to_lowercase();
        if queries::get_user_by_email(&self.pool, &email)
            .await?
            .is_some()
        {
            return Err(AppError::BusinessRule("Email already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: validation::sanitize_string(&req.name),
            address: req.address,
            phone: validation::sanitize_string(&req.phone),
            email,
            password_hash: hash_password(req.password)?.into_string(),
            role: req.role.unwrap_or(StaffRole::Staff),
            created_at: now,
            updated_at: now,
        };

        let created = queries::insert_user(&self.pool, &user).await?;
        tracing::info!(user_id = %created.id, role = ?created.role, "staff user registered");
        Ok(created)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = validation::sanitize_string(email).to_lowercase();
        let user = queries::get_user_by_email(&self.pool, &email).await?;

        match user {
            Some(u)
                if credentials::verify(
                    &Password::new(password.to_string()),
                    &PasswordDigest::from_stored(u.password_hash.clone()),
                ) =>
            {
                Ok(u)
            }
            _ => Err(AppError::Unauthorized("Invalid credentials".to_string())),
        }
    }

    pub async fn add_address(
        &self,
        customer_id: Uuid,
        req: NewAddress,
    ) -> Result<CustomerAddress, AppError> {
        validation::validate_required("address", &req.address)
            .and_then(|_| {
                validation::validate_max_len("address", &req.address, validation::ADDRESS_MAX_LEN)
            })
            .and_then(|_| validation::validate_required("city", &req.city))
            .and_then(|_| validation::validate_required("state", &req.state))
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if req.is_default {
            queries::clear_default_addresses(&self.pool, customer_id).await?;
        }

        let now = Utc::now();
        let address = CustomerAddress {
            id: Uuid::new_v4(),
            customer_id,
            address: req.address,
            city: validation::sanitize_string(&req.city),
            state: validation::sanitize_string(&req.state),
            postal_code: req.postal_code,
            is_default: req.is_default,
            created_at: now,
            updated_at: now,
        };

        Ok(queries::insert_address(&self.pool, &address).await?)
    }

    pub async fn list_addresses(&self, customer_id: Uuid) -> Result<Vec<CustomerAddress>, AppError> {
        Ok(queries::list_addresses(&self.pool, customer_id).await?)
    }
}
