//! Email transport functionality
//!
//! Provides the transport port consumed by the delivery queue, with two
//! implementations:
//! - SMTP (using lettre)
//! - AWS SES

pub mod provider;
pub mod ses;
pub mod smtp;
pub mod templates;

pub use provider::{EmailProvider, EmailProviderError};
pub use ses::SesEmailProvider;
pub use smtp::SmtpEmailProvider;
pub use templates::TemplateEngine;

use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use std::sync::Arc;

/// Build the configured transport once at startup
pub async fn build_provider(config: &EmailConfig) -> Result<Arc<dyn EmailProvider>> {
    match config {
        EmailConfig::Smtp(settings) => {
            let provider = SmtpEmailProvider::from_settings(settings).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create SMTP provider: {}", e))
            })?;
            Ok(Arc::new(provider))
        }
        EmailConfig::Ses(settings) => {
            let provider = SesEmailProvider::from_settings(settings).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create SES provider: {}", e))
            })?;
            Ok(Arc::new(provider))
        }
    }
}
