mod app_config;
mod smtp_config;

pub use app_config::{
    AppConfig, AuthConfig, BoldConfig, CorsConfig, DatabaseConfig, MailConfig, ServerConfig,
    SmtpConfig, StorageConfig,
};
pub use smtp_config::load_mailer;
