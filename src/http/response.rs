//! Conversion of buffered responses into HTTP responses.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use crate::render::Response;

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();

        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type.as_str()),
            );
        }
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }
        response
    }
}
