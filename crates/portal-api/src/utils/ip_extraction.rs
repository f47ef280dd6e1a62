//! Client address extraction for login throttling and auth logs.
//!
//! `X-Forwarded-For` is only honoured for the configured number of trusted proxies,
//! so a client cannot choose its own throttling key.

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::{request::Parts, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Client address resolved by [`client_ip_middleware`].
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ClientIp>()
            .cloned()
            .unwrap_or_else(|| ClientIp("unknown".to_string())))
    }
}

/// Resolve the client address once per request and store it as a [`ClientIp`] extension.
pub async fn client_ip_middleware(
    State(trusted_proxy_count): State<usize>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request, trusted_proxy_count);
    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}

/// Client address of a request, or "unknown".
pub fn client_ip(request: &Request, trusted_proxy_count: usize) -> String {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    extract_client_ip(request.headers(), socket_addr.as_ref(), trusted_proxy_count)
}

/// Extract and validate client IP from request headers
///
/// With `trusted_proxy_count` N > 0 the address N hops from the end of the
/// `X-Forwarded-For` chain is used. With 0, forwarding headers are ignored.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if trusted_proxy_count > 0 {
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| from_forwarded_for(v, trusted_proxy_count))
        {
            return ip;
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| is_valid_ip(ip))
        {
            return ip.to_string();
        }
    }

    socket_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    // The last `trusted_proxy_count` entries were appended by our own proxies.
    let position = ips.len().checked_sub(trusted_proxy_count)?;
    let candidate = if position == 0 {
        ips.first()?
    } else {
        ips.get(position - 1)?
    };
    is_valid_ip(candidate).then(|| candidate.to_string())
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(xff: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(xff).unwrap());
        headers
    }

    #[test]
    fn ignores_forwarding_headers_without_trusted_proxies() {
        let socket: SocketAddr = "192.0.2.7:5000".parse().unwrap();
        let ip = extract_client_ip(&headers("203.0.113.9"), Some(&socket), 0);
        assert_eq!(ip, "192.0.2.7");
    }

    #[test]
    fn takes_address_before_trusted_proxies() {
        let ip = extract_client_ip(&headers("203.0.113.9, 10.0.0.2"), None, 1);
        assert_eq!(ip, "203.0.113.9");

        let ip = extract_client_ip(&headers("198.51.100.1, 203.0.113.9, 10.0.0.2"), None, 1);
        assert_eq!(ip, "203.0.113.9");
    }

    #[test]
    fn invalid_chain_falls_back_to_socket() {
        let socket: SocketAddr = "192.0.2.7:5000".parse().unwrap();
        let ip = extract_client_ip(&headers("not-an-ip, 10.0.0.2"), Some(&socket), 1);
        assert_eq!(ip, "192.0.2.7");
        assert_eq!(extract_client_ip(&HeaderMap::new(), None, 1), "unknown");
    }
}
