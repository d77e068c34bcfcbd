use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Message used when a failure kind does not expose its own message
pub const DEFAULT_ERROR_MESSAGE: &str = "Error Occurred!!!";

/// Content type of every error envelope
pub const ENVELOPE_CONTENT_TYPE: &str = "application/json";

/// Error envelope returned in development mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentEnvelope {
    /// HTTP status code of the response
    pub status_code: u16,
    /// Application-specific status code
    pub clw_status_code: i64,
    /// Request ID for tracing
    pub request_id: String,
    /// Diagnostic payload (stack trace, raw failure, extra fields)
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    /// Human-readable error message
    pub message: String,
}

/// Error envelope returned in production mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEnvelope {
    /// HTTP status code of the response
    pub status_code: u16,
    /// Application-specific status code
    pub clw_status_code: i64,
    /// Request ID for tracing
    pub request_id: String,
    /// Human-readable error message
    pub message: String,
}

/// Rendered error body, shape depends on the environment mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Development(DevelopmentEnvelope),
    Production(ProductionEnvelope),
}

impl Envelope {
    pub fn request_id(&self) -> &str {
        match self {
            Self::Development(e) => &e.request_id,
            Self::Production(e) => &e.request_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_production_envelope_serialization() {
        let envelope = Envelope::Production(ProductionEnvelope {
            status_code: 404,
            clw_status_code: 4004,
            request_id: "abc".to_string(),
            message: "Not found".to_string(),
        });
        let json = String::from_utf8(envelope.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"statusCode":404,"clwStatusCode":4004,"requestId":"abc","message":"Not found"}"#
        );
    }

    #[test]
    fn test_development_envelope_keeps_null_data() {
        let envelope = Envelope::Development(DevelopmentEnvelope {
            status_code: 500,
            clw_status_code: 500,
            request_id: "abc".to_string(),
            data: None,
            message: DEFAULT_ERROR_MESSAGE.to_string(),
        });
        let value: Value = serde_json::from_slice(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(value["data"], Value::Null);
        assert!(value.as_object().unwrap().contains_key("data"));
    }

    #[test]
    fn test_development_envelope_field_order() {
        let envelope = Envelope::Development(DevelopmentEnvelope {
            status_code: 401,
            clw_status_code: 500,
            request_id: "id".to_string(),
            data: Some(json!({ "message": "expired" })),
            message: "m".to_string(),
        });
        let json = String::from_utf8(envelope.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"statusCode":401,"clwStatusCode":500,"requestId":"id","data":{"message":"expired"},"message":"m"}"#
        );
    }
}
