use crate::types::push::VapidConfig;

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "./data/notify.db";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CORS_ORIGIN: &str = "*";

#[derive(Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub cors_origin: String,
    pub vapid: VapidConfig,
    pub admin_key: String,
    /// Title of the notification greeting new subscribers, if any.
    pub welcome_message: Option<String>,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        let keys = crate::push::vapid::VapidKeys::generate();
        Self {
            db_path: DEFAULT_DB_PATH.into(),
            port: DEFAULT_PORT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            vapid: keys.into_config("mailto:ops@example.com"),
            admin_key: "admin-secret".to_string(),
            welcome_message: None,
        }
    }
}
