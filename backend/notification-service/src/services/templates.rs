/// Subject, plain-text and HTML bodies for each transactional message
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Context for a sign-in notification
#[derive(Debug, Clone)]
pub struct LoginAlert {
    pub at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub fn otp(app_name: &str, code: &str) -> RenderedEmail {
    let subject = format!("Your {app_name} verification code");
    let text_body = format!(
        "Your verification code is: {code}\n\n\
        Enter this code to continue. If you did not request it, you can ignore this email."
    );
    let html_body = layout(
        app_name,
        &format!(
            r#"<p>Your verification code is:</p>
    <p style="font-size: 28px; font-weight: bold; letter-spacing: 6px;">{code}</p>
    <p>Enter this code to continue. If you did not request it, you can ignore this email.</p>"#,
            code = escape_html(code)
        ),
    );

    RenderedEmail {
        subject,
        text_body,
        html_body,
    }
}

pub fn account_approved(app_name: &str, name: &str, login_url: &str) -> RenderedEmail {
    let subject = format!("Your {app_name} account has been approved");
    let text_body = format!(
        "Hello {name},\n\n\
        Good news: your account has been approved. You can now sign in:\n\
        {login_url}"
    );
    let html_body = layout(
        app_name,
        &format!(
            r#"<p>Hello {name},</p>
    <p>Good news: your account has been approved.</p>
    <p style="margin: 30px 0;">
        <a href="{url}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 25px; display: inline-block;">Sign in</a>
    </p>"#,
            name = escape_html(name),
            url = escape_html(login_url)
        ),
    );

    RenderedEmail {
        subject,
        text_body,
        html_body,
    }
}

pub fn account_rejected(app_name: &str, name: &str, reason: Option<&str>) -> RenderedEmail {
    let subject = format!("Update on your {app_name} application");
    let reason_text = reason
        .map(|r| format!("\n\nReason: {r}"))
        .unwrap_or_default();
    let text_body = format!(
        "Hello {name},\n\n\
        Unfortunately your account application was not approved.{reason_text}\n\n\
        If you believe this is a mistake, please contact support."
    );
    let reason_html = reason
        .map(|r| format!("\n    <p><strong>Reason:</strong> {}</p>", escape_html(r)))
        .unwrap_or_default();
    let html_body = layout(
        app_name,
        &format!(
            r#"<p>Hello {name},</p>
    <p>Unfortunately your account application was not approved.</p>{reason_html}
    <p>If you believe this is a mistake, please contact support.</p>"#,
            name = escape_html(name)
        ),
    );

    RenderedEmail {
        subject,
        text_body,
        html_body,
    }
}

pub fn login_alert(app_name: &str, alert: &LoginAlert) -> RenderedEmail {
    let subject = format!("New sign-in to your {app_name} account");
    let when = alert.at.format("%Y-%m-%d %H:%M UTC").to_string();
    let ip = alert.ip_address.as_deref().unwrap_or("unknown");
    let agent = alert.user_agent.as_deref().unwrap_or("unknown");

    let text_body = format!(
        "We noticed a new sign-in to your account.\n\n\
        Time: {when}\n\
        IP address: {ip}\n\
        Device: {agent}\n\n\
        If this was you, no action is needed. Otherwise, reset your password immediately."
    );
    let html_body = layout(
        app_name,
        &format!(
            r#"<p>We noticed a new sign-in to your account.</p>
    <ul>
        <li>Time: {when}</li>
        <li>IP address: {ip}</li>
        <li>Device: {agent}</li>
    </ul>
    <p>If this was you, no action is needed. Otherwise, reset your password immediately.</p>"#,
            ip = escape_html(ip),
            agent = escape_html(agent)
        ),
    );

    RenderedEmail {
        subject,
        text_body,
        html_body,
    }
}

pub fn password_reset(app_name: &str, role: &str, link: &str) -> RenderedEmail {
    let subject = format!("{app_name} Password Reset");
    let account = role_label(role);
    let text_body = format!(
        "We received a password reset request for your {account} account.\n\n\
        Please click the following link to reset your password:\n\
        {link}\n\n\
        This link will expire soon.\n\
        If you did not request this, please ignore this email or contact support immediately."
    );
    let html_body = layout(
        app_name,
        &format!(
            r#"<h2>Password Reset Request</h2>
    <p>We received a password reset request for your {account} account.</p>
    <p style="margin: 30px 0;">
        <a href="{link}" style="background-color: #000; color: #fff; padding: 14px 28px; text-decoration: none; border-radius: 25px; display: inline-block;">Reset Password</a>
    </p>
    <p style="color: #666; font-size: 14px;">
        If the button doesn't work, please copy the following link to your browser:<br>
        <a href="{link}" style="color: #007AFF;">{link}</a>
    </p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">
        This link will expire soon.<br>
        If you did not request this, please ignore this email or contact support immediately.
    </p>"#,
            account = escape_html(&account),
            link = escape_html(link)
        ),
    );

    RenderedEmail {
        subject,
        text_body,
        html_body,
    }
}

fn role_label(role: &str) -> String {
    match role.trim() {
        "" => "user".to_string(),
        r => r.to_lowercase(),
    }
}

fn layout(app_name: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; padding: 20px; color: #333;">
    {content}
    <p style="color: #999; font-size: 12px; margin-top: 30px;">{title}</p>
</body>
</html>"#,
        title = escape_html(app_name),
    )
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
