use serde::Serialize;
use utoipa::ToSchema;

/// Envelope for the plain JSON endpoints outside GraphQL.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_message_and_data_only() {
        let body = serde_json::to_value(ApiResponse::success("Not Found", "/missing")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "message": "Not Found", "data": "/missing" })
        );
    }
}
