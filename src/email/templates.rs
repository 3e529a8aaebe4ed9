//! Email template system
//!
//! Simple variable substitution for the notification templates. Variables
//! use {{variable_name}} syntax.

use crate::domain::{EmailAddress, EmailMessage, JobKind, QueuedJob};
use std::collections::HashMap;

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Render a template string, replacing {{variable}} with values
    pub fn render(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (key, value) in &self.variables {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }
        result
    }
}

fn subject_for(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Verification => "Confirm your email address",
        JobKind::PasswordReset => "Reset your password",
        JobKind::Welcome => "Welcome to {{app_name}}",
    }
}

fn html_for(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Verification => VERIFICATION_TEMPLATE,
        JobKind::PasswordReset => PASSWORD_RESET_TEMPLATE,
        JobKind::Welcome => WELCOME_TEMPLATE,
    }
}

fn text_for(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Verification => VERIFICATION_TEMPLATE_TEXT,
        JobKind::PasswordReset => PASSWORD_RESET_TEMPLATE_TEXT,
        JobKind::Welcome => WELCOME_TEMPLATE_TEXT,
    }
}

/// Render the message for a queued job.
///
/// The payload is opaque to the queue; the keys the templates know are
/// read here, with neutral fallbacks for anything missing.
pub fn render(job: &QueuedJob) -> EmailMessage {
    let payload = &job.payload;
    let str_field = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(String::from);

    let user_name = str_field("userName").unwrap_or_else(|| {
        job.recipient
            .split('@')
            .next()
            .unwrap_or("there")
            .to_string()
    });

    let mut engine = TemplateEngine::new();
    engine
        .set("app_name", "Mailgate")
        .set("user_name", user_name)
        .set("year", chrono::Utc::now().format("%Y").to_string())
        .set(
            "action_url",
            str_field("actionUrl").unwrap_or_default(),
        )
        .set(
            "expires_in",
            str_field("expiresIn").unwrap_or_else(|| "24 hours".to_string()),
        );

    EmailMessage::new(
        EmailAddress::new(&job.recipient),
        engine.render(subject_for(job.kind)),
        engine.render(html_for(job.kind)),
    )
    .with_text_body(engine.render(text_for(job.kind)))
}

// ============================================================================
// Templates
// ============================================================================

const VERIFICATION_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Confirm Your Email</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5;">
    <div style="max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px;">
        <h1 style="color: #2563eb; font-size: 24px;">Confirm Your Email</h1>
        <p>Hi {{user_name}},</p>
        <p>Please confirm your email address to finish setting up your {{app_name}} account.</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{action_url}}" style="display: inline-block; background-color: #2563eb; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600;">Confirm Email</a>
        </p>
        <p style="font-size: 14px; color: #666;">
            Or copy and paste this link into your browser:<br>
            <a href="{{action_url}}" style="color: #2563eb; word-break: break-all;">{{action_url}}</a>
        </p>
        <p style="font-size: 14px; color: #666;">This link will expire in {{expires_in}}.</p>
        <div style="text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee;">
            <p>If you didn't request this email, you can safely ignore it.</p>
            <p>&copy; {{year}} {{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const VERIFICATION_TEMPLATE_TEXT: &str = r#"Confirm Your Email

Hi {{user_name}},

Please confirm your email address to finish setting up your {{app_name}} account:

{{action_url}}

This link will expire in {{expires_in}}.

If you didn't request this email, you can safely ignore it.

(c) {{year}} {{app_name}}"#;

const PASSWORD_RESET_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Password Reset</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5;">
    <div style="max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px;">
        <h1 style="color: #2563eb; font-size: 24px;">Reset Your Password</h1>
        <p>Hi {{user_name}},</p>
        <p>We received a request to reset the password for your {{app_name}} account.</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{action_url}}" style="display: inline-block; background-color: #2563eb; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600;">Reset Password</a>
        </p>
        <p style="font-size: 14px; color: #666;">
            Or copy and paste this link into your browser:<br>
            <a href="{{action_url}}" style="color: #2563eb; word-break: break-all;">{{action_url}}</a>
        </p>
        <p style="font-size: 14px; color: #666;">This link will expire in {{expires_in}}.</p>
        <div style="text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee;">
            <p>If you didn't request a password reset, you can safely ignore this email.</p>
            <p>&copy; {{year}} {{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const PASSWORD_RESET_TEMPLATE_TEXT: &str = r#"Reset Your Password

Hi {{user_name}},

We received a request to reset the password for your {{app_name}} account:

{{action_url}}

This link will expire in {{expires_in}}.

If you didn't request a password reset, you can safely ignore this email.

(c) {{year}} {{app_name}}"#;

const WELCOME_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Welcome</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5;">
    <div style="max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px;">
        <h1 style="color: #2563eb; font-size: 24px;">Welcome, {{user_name}}!</h1>
        <p>Your {{app_name}} account is ready.</p>
        <p>We're glad to have you. If you have any questions, just reply to this email.</p>
        <div style="text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee;">
            <p>&copy; {{year}} {{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const WELCOME_TEMPLATE_TEXT: &str = r#"Welcome, {{user_name}}!

Your {{app_name}} account is ready.

We're glad to have you. If you have any questions, just reply to this email.

(c) {{year}} {{app_name}}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmailJob;
    use chrono::Utc;

    fn queued(kind: JobKind, payload: serde_json::Value) -> QueuedJob {
        QueuedJob::from_request(
            "job-1".to_string(),
            EmailJob::new(kind, "alice@example.com", payload),
            Utc::now(),
        )
    }

    #[test]
    fn test_engine_substitutes_variables() {
        let mut engine = TemplateEngine::new();
        engine.set("name", "Alice").set("city", "Berlin");
        assert_eq!(
            engine.render("Hello {{name}} from {{city}}!"),
            "Hello Alice from Berlin!"
        );
    }

    #[test]
    fn test_engine_leaves_unknown_placeholders() {
        let engine = TemplateEngine::new();
        assert_eq!(engine.render("Hi {{unknown}}"), "Hi {{unknown}}");
    }

    #[test]
    fn test_render_verification_uses_payload() {
        let job = queued(
            JobKind::Verification,
            serde_json::json!({
                "userName": "Alice",
                "actionUrl": "https://example.com/auth/verify?token=abc",
                "expiresIn": "24 hours",
            }),
        );

        let message = render(&job);
        assert_eq!(message.to.email, "alice@example.com");
        assert_eq!(message.subject, "Confirm your email address");
        assert!(message.html_body.contains("Hi Alice"));
        assert!(message
            .html_body
            .contains("https://example.com/auth/verify?token=abc"));
        assert!(message.text_body.unwrap().contains("24 hours"));
    }

    #[test]
    fn test_render_falls_back_to_local_part() {
        let job = queued(JobKind::Welcome, serde_json::json!({}));
        let message = render(&job);
        assert!(message.html_body.contains("Welcome, alice!"));
    }

    #[test]
    fn test_render_password_reset_subject() {
        let job = queued(JobKind::PasswordReset, serde_json::json!({"userName": "Bob"}));
        let message = render(&job);
        assert_eq!(message.subject, "Reset your password");
        assert!(message.html_body.contains("Hi Bob"));
    }

    #[test]
    fn test_render_welcome_subject_substitutes_app_name() {
        let job = queued(JobKind::Welcome, serde_json::json!({}));
        let message = render(&job);
        assert_eq!(message.subject, "Welcome to Mailgate");
    }
}
