use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id for one API call, available to handlers as an extension.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Keep a caller-supplied id (reverse proxy, batch client) when it is
    /// usable as a header value; otherwise mint a UUID v4.
    pub fn from_request(request: &Request) -> Self {
        let id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= 128)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self(id)
    }
}

/// Runs the rest of the request inside an `enrichment` span carrying the id,
/// so every adapter and batch log line for this call can be correlated.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request);

    tracing::Span::current().record("request_id", request_id.0.as_str());
    let span = tracing::info_span!("enrichment", request_id = %request_id.0);

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).instrument(span).await;
    if let Ok(val) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|Extension(RequestId(id)): Extension<RequestId>| async move { id }),
            )
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_caller_id_is_propagated() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/echo")
                    .header(REQUEST_ID_HEADER, " batch-42 ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "batch-42");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"batch-42");
    }

    #[tokio::test]
    async fn test_missing_or_oversized_id_is_replaced() {
        for header in [None, Some("x".repeat(300))] {
            let mut builder = axum::http::Request::builder().uri("/echo");
            if let Some(value) = header {
                builder = builder.header(REQUEST_ID_HEADER, value);
            }
            let response = app()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();

            let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
            assert!(Uuid::parse_str(id).is_ok(), "expected a UUID, got {}", id);
        }
    }
}
