use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::{extract::Request, middleware::Next, response::Response};

/// Options for [`security_headers_middleware`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityHeaders {
    /// Send `Strict-Transport-Security`. Only enable behind HTTPS.
    pub hsts: bool,
}

/// Adds security headers to all HTTP responses.
///
/// Responses carry account data and signed download links, so nothing is cacheable.
pub async fn security_headers_middleware(
    State(options): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store"));

    if options.hsts {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use axum_test::TestServer;

    fn app(options: SecurityHeaders) -> Router {
        Router::new().route("/", get(|| async { "ok" })).layer(
            middleware::from_fn_with_state(options, security_headers_middleware),
        )
    }

    #[tokio::test]
    async fn sets_baseline_headers() {
        let server = TestServer::new(app(SecurityHeaders::default())).unwrap();
        let response = server.get("/").await;
        assert_eq!(response.header("x-content-type-options"), "nosniff");
        assert_eq!(response.header("x-frame-options"), "DENY");
        assert_eq!(response.header("cache-control"), "no-store");
        assert!(response
            .headers()
            .get(header::STRICT_TRANSPORT_SECURITY)
            .is_none());
    }

    #[tokio::test]
    async fn hsts_only_when_enabled() {
        let server = TestServer::new(app(SecurityHeaders { hsts: true })).unwrap();
        let response = server.get("/").await;
        assert_eq!(
            response.header("strict-transport-security"),
            "max-age=31536000; includeSubDomains"
        );
    }
}
