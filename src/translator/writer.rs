use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// The part of an outgoing HTTP response the translator writes to
#[async_trait]
pub trait ResponseWriter: Send {
    /// Whether bytes have already been sent to the client
    fn has_started(&self) -> bool;

    fn set_status(&mut self, status: StatusCode);

    fn set_content_type(&mut self, content_type: &'static str);

    async fn write_body(&mut self, body: Bytes);
}

/// In-memory response, converted into an axum response once written
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    content_type: Option<&'static str>,
    body: Option<Bytes>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseWriter for BufferedResponse {
    fn has_started(&self) -> bool {
        // Nothing reaches the client before `into_response`
        false
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn set_content_type(&mut self, content_type: &'static str) {
        self.content_type = Some(content_type);
    }

    async fn write_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body.map(Body::from).unwrap_or_else(Body::empty));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffered_response_into_response() {
        let mut writer = BufferedResponse::new();
        assert!(!writer.has_started());

        writer.set_status(StatusCode::NOT_FOUND);
        writer.set_content_type("application/json");
        writer.write_body(Bytes::from_static(b"{}")).await;

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"{}");
    }

    #[test]
    fn test_untouched_buffered_response_is_empty_ok() {
        let response = BufferedResponse::new().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
