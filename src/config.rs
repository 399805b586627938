use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_path: String,
    pub storage_root: PathBuf,
    pub admin_name: String,
    pub admin_email: String,
    /// When unset no admin user is seeded and every gated endpoint is
    /// unreachable until one is created out of band.
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "portfolio.db".to_string()),
            storage_root: env::var("STORAGE_ROOT")
                .unwrap_or_else(|_| "storage".to_string())
                .into(),
            admin_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}
