/// Mail transports: SMTP via lettre, or a no-op that only logs
use crate::config::EmailSettings;
use crate::error::{NotificationError, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// A fully rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Mailbox,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<()>;
}

/// Build the transport described by `settings`
///
/// If the SMTP host is blank, returns a no-op transport (logs only).
pub fn transport_from_settings(settings: &EmailSettings) -> Result<Arc<dyn MailTransport>> {
    if settings.smtp_host.trim().is_empty() {
        warn!("SMTP host not configured; email will operate in no-op mode");
        return Ok(Arc::new(NoopMailTransport));
    }
    Ok(Arc::new(SmtpMailTransport::new(settings)?))
}

/// Async SMTP delivery
#[derive(Clone)]
pub struct SmtpMailTransport {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailTransport {
    /// STARTTLS when requested; plaintext for loopback hosts (local mail
    /// catchers); implicit TLS otherwise.
    pub fn new(settings: &EmailSettings) -> Result<Self> {
        let from = parse_sender(&settings.smtp_from)?;
        let host = settings.smtp_host.trim();

        let builder = if settings.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else if is_loopback(host) {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        }
        .port(settings.smtp_port);

        let builder = if let (Some(username), Some(password)) =
            (&settings.smtp_username, &settings.smtp_password)
        {
            builder.credentials(Credentials::new(username.to_string(), password.to_string()))
        } else {
            builder
        };

        Ok(Self {
            transport: Arc::new(builder.build()),
            from,
        })
    }

    fn build_message(&self, email: OutboundEmail) -> Result<Message> {
        let builder = Message::builder()
            .from(self.from.clone())
            .to(email.to)
            .subject(email.subject);

        let message = match email.html_body {
            Some(html) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(email.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?,
            None => builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(email.text_body)?,
        };

        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let subject = email.subject.clone();
        let message = self.build_message(email)?;

        self.transport.send(message).await?;
        info!(subject = %subject, "email sent successfully");
        Ok(())
    }
}

/// Swallows messages, logging what would have been sent
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        info!(
            subject = %email.subject,
            recipient = %email.to,
            "Email running in no-op mode; skipping actual send"
        );
        Ok(())
    }
}

pub(crate) fn parse_recipient(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| NotificationError::InvalidAddress(format!("{address}: {e}")))
}

fn parse_sender(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotificationError::Config(format!("Invalid SMTP_FROM address: {e}")))
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}
