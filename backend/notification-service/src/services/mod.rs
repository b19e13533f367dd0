/// Service layer for notification-service
///
/// - Mail transports (SMTP via lettre, no-op for development)
/// - Message templates
/// - Notification dispatcher (depends on token-core for reset links)
pub mod mailer;
pub mod notification_service;
pub mod templates;

pub use mailer::{
    transport_from_settings, MailTransport, NoopMailTransport, OutboundEmail, SmtpMailTransport,
};
pub use notification_service::{NotificationService, ResetTokenIssuer};
pub use templates::{LoginAlert, RenderedEmail};
