//! Business logic layer

pub mod resend;

pub use resend::{ResendOutcome, ResendService};
