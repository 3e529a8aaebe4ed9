//! AWS SES email provider implementation
//!
//! Sends via the SES v2 API using the default credential chain (IAM role,
//! env vars, shared config).

use super::provider::{EmailProvider, EmailProviderError};
use crate::config::SesSettings;
use crate::domain::{EmailMessage, EmailSendResult};
use async_trait::async_trait;
use aws_sdk_sesv2::{
    config::Region,
    types::{Body, Content, Destination, EmailContent, Message},
    Client,
};

/// AWS SES transport
pub struct SesEmailProvider {
    client: Client,
    from_email: String,
    from_name: Option<String>,
}

impl SesEmailProvider {
    /// Create a new SES provider; async because the SDK loads credentials.
    pub async fn from_settings(settings: &SesSettings) -> Result<Self, EmailProviderError> {
        let sdk_config = aws_config::from_env()
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        Ok(Self {
            client: Client::new(&sdk_config),
            from_email: settings.from_email.clone(),
            from_name: settings.from_name.clone(),
        })
    }

    fn from_address(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_email),
            None => self.from_email.clone(),
        }
    }

    fn classify(error_msg: String) -> EmailProviderError {
        if error_msg.contains("AccessDenied")
            || error_msg.contains("InvalidClientTokenId")
            || error_msg.contains("SignatureDoesNotMatch")
        {
            EmailProviderError::AuthenticationFailed(error_msg)
        } else if error_msg.contains("Throttling") || error_msg.contains("rate") {
            EmailProviderError::RateLimited
        } else if error_msg.contains("connection") || error_msg.contains("timeout") {
            EmailProviderError::ConnectionError(error_msg)
        } else {
            EmailProviderError::SendFailed(error_msg)
        }
    }
}

#[async_trait]
impl EmailProvider for SesEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        let to_address = match &message.to.name {
            Some(name) => format!("{} <{}>", name, message.to.email),
            None => message.to.email.clone(),
        };

        let destination = Destination::builder().to_addresses(to_address).build();

        let subject = Content::builder()
            .data(&message.subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?;

        let html_body = Content::builder()
            .data(&message.html_body)
            .charset("UTF-8")
            .build()
            .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?;

        let mut body_builder = Body::builder().html(html_body);

        if let Some(text) = &message.text_body {
            let text_body = Content::builder()
                .data(text)
                .charset("UTF-8")
                .build()
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?;
            body_builder = body_builder.text(text_body);
        }

        let ses_message = Message::builder()
            .subject(subject)
            .body(body_builder.build())
            .build();

        let response = self
            .client
            .send_email()
            .from_email_address(self.from_address())
            .destination(destination)
            .content(EmailContent::builder().simple(ses_message).build())
            .send()
            .await
            .map_err(|e| Self::classify(e.to_string()))?;

        Ok(EmailSendResult::success(response.message_id))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        // Account lookup validates credentials and connectivity
        self.client
            .get_account()
            .send()
            .await
            .map(|_| ())
            .map_err(|e| Self::classify(e.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "ses"
    }
}
