//! Mailgate - Outbound Notification Email Gateway
//!
//! This crate provides the core functionality for the Mailgate service:
//! an abuse-resistant resend gate guarding an asynchronous email delivery
//! queue, exposed over a small REST API.

pub mod api;
pub mod clock;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod openapi;
pub mod queue;
pub mod repository;
pub mod server;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
