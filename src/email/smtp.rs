//! SMTP email provider implementation using lettre

use super::provider::{EmailProvider, EmailProviderError};
use crate::config::SmtpSettings;
use crate::domain::{EmailMessage, EmailSendResult};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// SMTP relay transport
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: Option<String>,
}

impl SmtpEmailProvider {
    /// Build the transport once from settings
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, EmailProviderError> {
        let mut builder = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        builder = builder.port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_email: settings.from_email.clone(),
            from_name: settings.from_name.clone(),
        })
    }

    fn from_mailbox(&self) -> Result<Mailbox, EmailProviderError> {
        let mailbox = match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_email),
            None => self.from_email.clone(),
        };

        mailbox.parse().map_err(|e| {
            EmailProviderError::InvalidConfiguration(format!("Invalid from address: {}", e))
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        let from = self.from_mailbox()?;

        let to: Mailbox = match &message.to.name {
            Some(name) => format!("{} <{}>", name, message.to.email),
            None => message.to.email.clone(),
        }
        .parse()
        .map_err(|e| {
            EmailProviderError::InvalidConfiguration(format!("Invalid to address: {}", e))
        })?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject);

        let email = if let Some(text_body) = &message.text_body {
            builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            )
        } else {
            builder
                .header(ContentType::TEXT_HTML)
                .body(message.html_body.clone())
        }
        .map_err(|e| EmailProviderError::SendFailed(format!("Message build error: {}", e)))?;

        match self.transport.send(email).await {
            Ok(response) => Ok(EmailSendResult::success(Some(
                response.message().collect::<Vec<_>>().join(" "),
            ))),
            Err(e) if e.is_permanent() => Err(EmailProviderError::SendFailed(e.to_string())),
            Err(e) if e.is_client() => Err(EmailProviderError::SendFailed(e.to_string())),
            Err(e) => Err(EmailProviderError::ConnectionError(e.to_string())),
        }
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(EmailProviderError::ConnectionError(
                "SMTP server did not respond to NOOP".to_string(),
            )),
            Err(e) => Err(EmailProviderError::ConnectionError(e.to_string())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}
