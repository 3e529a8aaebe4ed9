//! Email message domain types

/// Email address with optional display name
#[derive(Debug, Clone)]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

/// Rendered email ready for a transport
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

impl EmailMessage {
    pub fn new(to: EmailAddress, subject: impl Into<String>, html_body: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            html_body: html_body.into(),
            text_body: None,
        }
    }

    pub fn with_text_body(mut self, text_body: impl Into<String>) -> Self {
        self.text_body = Some(text_body.into());
        self
    }
}

/// Result of handing a message to a transport
#[derive(Debug)]
pub struct EmailSendResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl EmailSendResult {
    pub fn success(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_address() {
        let addr = EmailAddress::new("test@example.com");
        assert_eq!(addr.email, "test@example.com");
        assert!(addr.name.is_none());

        let addr = EmailAddress::with_name("test@example.com", "Test User");
        assert_eq!(addr.name.unwrap(), "Test User");
    }

    #[test]
    fn test_email_message() {
        let msg = EmailMessage::new(
            EmailAddress::new("to@example.com"),
            "Subject",
            "<p>Hello</p>",
        );
        assert_eq!(msg.subject, "Subject");
        assert!(msg.text_body.is_none());

        let msg = msg.with_text_body("Hello");
        assert_eq!(msg.text_body.unwrap(), "Hello");
    }

    #[test]
    fn test_email_send_result() {
        let ok = EmailSendResult::success(Some("msg-123".to_string()));
        assert!(ok.success);
        assert_eq!(ok.message_id.unwrap(), "msg-123");

        let failed = EmailSendResult::failure("Connection refused");
        assert!(!failed.success);
        assert_eq!(failed.error.unwrap(), "Connection refused");
    }
}
