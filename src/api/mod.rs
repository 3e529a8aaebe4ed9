//! REST API handlers and shared response types

pub mod health;
pub mod metrics;
pub mod queue;
pub mod resend;

use serde::Serialize;
use utoipa::ToSchema;

/// Success response wrapper: `{ success: true, message, data }`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_shape() {
        let response = SuccessResponse::new("done", serde_json::json!({"n": 1}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "done");
        assert_eq!(json["data"]["n"], 1);
    }
}
