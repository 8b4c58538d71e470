use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub paystack_base_url: String,
    pub paystack_secret_key: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            paystack_base_url: env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_ttl_hours: env::var("JWT_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),
        })
    }
}
