//! Bearer token issuance and verification. The signing key is plain
//! process configuration handed in at construction; there is no ambient
//! secret anywhere in this module.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::StaffRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    User,
    Vendor,
    Customer,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::User => "user",
            ActorType::Vendor => "vendor",
            ActorType::Customer => "customer",
        }
    }
}

/// Authenticated caller resolved by the auth middleware and attached to
/// the request. `role` is populated for staff users only.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub actor: ActorType,
    pub role: Option<StaffRole>,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.actor == ActorType::User
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub actor: ActorType,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("invalid or expired token")]
    Invalid,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, id: Uuid, actor: ActorType) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: id,
            actor,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| TokenError::Invalid)
    }
}
