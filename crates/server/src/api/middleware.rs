//! Request metrics middleware and the upload session extractor.

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use marquee_core::UploadSession;

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Extractor for the credentials and peer address of an upload.
///
/// Header names are lowercased; headers that are not valid UTF-8 are
/// skipped. The source address is only known when the server was started
/// with connect info.
#[derive(Debug, Clone)]
pub struct UploadClient(pub UploadSession);

impl<S> FromRequestParts<S> for UploadClient
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let source_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let session = parts
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .fold(UploadSession::new(source_ip), |session, (name, value)| {
                session.with_header(name, value)
            });

        std::future::ready(Ok(UploadClient(session)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn password_handler(UploadClient(session): UploadClient) -> String {
        session
            .header("x-upload-password")
            .unwrap_or("none")
            .to_string()
    }

    async fn ip_handler(UploadClient(session): UploadClient) -> String {
        session
            .source_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    async fn body_of(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_upload_client_collects_headers_case_insensitively() {
        let app = Router::new().route("/test", get(password_handler));

        let request = Request::builder()
            .uri("/test")
            .header("X-Upload-Password", "popcorn")
            .header(header::USER_AGENT, "pos/1.0")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "popcorn");
    }

    #[tokio::test]
    async fn test_upload_client_without_connect_info() {
        let app = Router::new().route("/test", get(ip_handler));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(body_of(response).await, "unknown");
    }

    #[tokio::test]
    async fn test_upload_client_reads_connect_info() {
        let app = Router::new().route("/test", get(ip_handler));

        let mut request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 51000))));

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(body_of(response).await, "10.0.0.7");
    }

    #[tokio::test]
    async fn test_metrics_middleware_counts_requests() {
        async fn ok() -> &'static str {
            "OK"
        }

        let app = Router::new()
            .route("/api/v1/signs/{id}", get(ok))
            .layer(middleware::from_fn(metrics_middleware));

        let request = Request::builder()
            .uri("/api/v1/signs/lobby-left")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let count = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/v1/signs/{id}", "200"])
            .get();
        assert!(count >= 1);
    }
}
