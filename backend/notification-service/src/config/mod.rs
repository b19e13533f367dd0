//! Configuration for the notification dispatcher
//!
//! Loads settings from environment variables, with a `.env` file honoured in
//! development builds. Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use tracing::info;

const DEFAULT_SMTP_HOST: &str = "localhost";

/// Outbound email settings
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    /// Blank host switches the dispatcher to no-op delivery
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
    /// Product name shown in subjects and greetings
    pub app_name: String,
    /// Reset links are built as `{password_reset_base_url}?token={token}`
    pub password_reset_base_url: String,
    pub login_url: String,
}

impl EmailSettings {
    pub fn from_env() -> Result<Self> {
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok().filter(|v| !v.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty()),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@recruitment.local".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid SMTP_USE_STARTTLS")?,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Recruitment Portal".to_string()),
            password_reset_base_url: env::var("PASSWORD_RESET_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/reset-password".to_string()),
            login_url: env::var("LOGIN_URL")
                .unwrap_or_else(|_| "http://localhost:3000/login".to_string()),
        })
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: 1025,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@recruitment.local".to_string(),
            use_starttls: false,
            app_name: "Recruitment Portal".to_string(),
            password_reset_base_url: "http://localhost:3000/reset-password".to_string(),
            login_url: "http://localhost:3000/login".to_string(),
        }
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "<redacted>"))
            .field("smtp_from", &self.smtp_from)
            .field("use_starttls", &self.use_starttls)
            .field("app_name", &self.app_name)
            .field("password_reset_base_url", &self.password_reset_base_url)
            .field("login_url", &self.login_url)
            .finish()
    }
}
