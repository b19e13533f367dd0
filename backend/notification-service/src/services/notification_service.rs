/// Transactional email dispatcher
///
/// Composes and sends OTP, approval, rejection, login-alert and password-reset
/// messages. Password-reset messages pull a fresh reset token from a
/// [`ResetTokenIssuer`] before the link is built; if issuance fails, nothing
/// is sent.
use super::mailer::{parse_recipient, MailTransport, OutboundEmail};
use super::templates::{self, LoginAlert, RenderedEmail};
use crate::config::EmailSettings;
use crate::error::Result;
use lettre::message::Mailbox;
use std::sync::Arc;
use token_core::{TokenError, TokenService};
use tracing::{error, info};

/// The one capability the dispatcher needs from the token service
#[cfg_attr(test, mockall::automock)]
pub trait ResetTokenIssuer: Send + Sync {
    fn issue_reset_token(&self, email: &str, role: &str) -> std::result::Result<String, TokenError>;
}

impl ResetTokenIssuer for TokenService {
    fn issue_reset_token(&self, email: &str, role: &str) -> std::result::Result<String, TokenError> {
        TokenService::issue_reset_token(self, email, role)
    }
}

/// Main Notification Service
#[derive(Clone)]
pub struct NotificationService {
    transport: Arc<dyn MailTransport>,
    reset_tokens: Arc<dyn ResetTokenIssuer>,
    app_name: String,
    password_reset_base_url: String,
    login_url: String,
}

impl NotificationService {
    pub fn new(
        settings: &EmailSettings,
        transport: Arc<dyn MailTransport>,
        reset_tokens: Arc<dyn ResetTokenIssuer>,
    ) -> Self {
        Self {
            transport,
            reset_tokens,
            app_name: settings.app_name.clone(),
            password_reset_base_url: settings.password_reset_base_url.clone(),
            login_url: settings.login_url.clone(),
        }
    }

    /// Send a one-time passcode
    pub async fn send_otp(&self, recipient: &str, code: &str) -> Result<()> {
        let to = parse_recipient(recipient)?;
        self.deliver("otp", to, templates::otp(&self.app_name, code))
            .await
    }

    pub async fn send_account_approved(&self, recipient: &str, name: &str) -> Result<()> {
        let to = parse_recipient(recipient)?;
        let email = templates::account_approved(&self.app_name, name, &self.login_url);
        self.deliver("account_approved", to, email).await
    }

    pub async fn send_account_rejected(
        &self,
        recipient: &str,
        name: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        let to = parse_recipient(recipient)?;
        let email = templates::account_rejected(&self.app_name, name, reason);
        self.deliver("account_rejected", to, email).await
    }

    pub async fn send_login_alert(&self, recipient: &str, alert: LoginAlert) -> Result<()> {
        let to = parse_recipient(recipient)?;
        let email = templates::login_alert(&self.app_name, &alert);
        self.deliver("login_alert", to, email).await
    }

    /// Issue a reset token for `recipient` and email the reset link
    ///
    /// The token is bound to the bare address the message is delivered to,
    /// without display name or surrounding whitespace. Token issuance happens
    /// first. If it fails the error is returned and no message is sent.
    pub async fn send_password_reset(&self, recipient: &str, role: &str) -> Result<()> {
        let to = parse_recipient(recipient)?;

        let token = self
            .reset_tokens
            .issue_reset_token(&to.email.to_string(), role)
            .map_err(|e| {
                error!(error = %e, "Password reset token issuance failed; email not sent");
                e
            })?;

        let link = self.build_password_reset_link(&token);
        let email = templates::password_reset(&self.app_name, role, &link);
        self.deliver("password_reset", to, email).await
    }

    fn build_password_reset_link(&self, token: &str) -> String {
        let base = self.password_reset_base_url.trim_end_matches('?');
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}token={token}")
    }

    async fn deliver(&self, kind: &'static str, to: Mailbox, email: RenderedEmail) -> Result<()> {
        let outbound = OutboundEmail {
            to,
            subject: email.subject,
            text_body: email.text_body,
            html_body: Some(email.html_body),
        };

        self.transport.send(outbound).await.map_err(|e| {
            error!(kind, error = %e, "Failed to deliver notification");
            e
        })?;
        info!(kind, "Notification dispatched");
        Ok(())
    }
}
