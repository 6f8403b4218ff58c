use crate::error::{AppError, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
    pub bold: BoldConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub from_name: String,
    pub orders_to: String,
    pub contact_to: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: String,
    pub public_base_url: String,
}

impl StorageConfig {
    /// Absolute URL for a file on the public disk.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/{}",
            self.public_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone)]
pub struct BoldConfig {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub currency: String,
    pub base_url: String,
    pub callback_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let from_address = env::var("MAIL_FROM_ADDRESS")?;
        let orders_to = env::var("ORDERS_EMAIL")?;

        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid PORT value".to_string()))?,
                max_body_size: env::var("MAX_BODY_SIZE")
                    .unwrap_or_else(|_| "10485760".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid MAX_BODY_SIZE value".to_string()))?,
            },
            database: DatabaseConfig {
                url: env::var("DB_URL")?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::ConfigError("Invalid DB_MAX_CONNECTIONS value".to_string())
                    })?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("FRONTEND_URL")?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")?,
                token_ttl_minutes: env::var("JWT_TTL_MINUTES")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid JWT_TTL_MINUTES value".to_string()))?,
                refresh_ttl_days: env::var("JWT_REFRESH_TTL_DAYS")
                    .unwrap_or_else(|_| "14".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::ConfigError("Invalid JWT_REFRESH_TTL_DAYS value".to_string())
                    })?,
                cookie_name: env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "token".to_string()),
                cookie_secure: env::var("AUTH_COOKIE_SECURE")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
            },
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST")?,
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid SMTP_PORT value".to_string()))?,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
                starttls: env::var("SMTP_STARTTLS")
                    .map(|v| v != "false" && v != "0")
                    .unwrap_or(true),
            },
            mail: MailConfig {
                contact_to: env::var("CONTACT_EMAIL").unwrap_or_else(|_| orders_to.clone()),
                from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Mese".to_string()),
                from_address,
                orders_to,
            },
            storage: StorageConfig {
                root: env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage/public".to_string()),
                public_base_url: env::var("APP_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
            bold: BoldConfig {
                api_key: env::var("BOLD_API_KEY").ok(),
                secret_key: env::var("BOLD_SECRET_KEY").ok(),
                currency: env::var("BOLD_CURRENCY").unwrap_or_else(|_| "COP".to_string()),
                base_url: env::var("BOLD_BASE_URL")
                    .unwrap_or_else(|_| "https://integrations.api.bold.co".to_string()),
                callback_url: env::var("BOLD_CALLBACK_URL").ok(),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
