/// Notification Service Library
///
/// Delivers transactional email for the recruitment platform: one-time
/// passcodes, account approval and rejection, login alerts, and
/// password-reset links backed by token-core.
///
/// ## Modules
///
/// - `config`: SMTP and link settings
/// - `error`: Error types
/// - `services`: Transports, templates and the dispatcher
pub mod config;
pub mod error;
pub mod services;

pub use config::EmailSettings;
pub use error::{NotificationError, Result};
pub use services::*;
