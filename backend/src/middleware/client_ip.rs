//! Client address extraction

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Best-effort address of the calling client.
///
/// Proxy headers win over the socket peer; "unknown" when nothing is
/// available (e.g. in-process test requests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

pub(crate) fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = forwarded_ip(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(request: Request<()>) -> ClientIp {
        let (mut parts, _) = request.into_parts();
        match ClientIp::from_request_parts(&mut parts, &()).await {
            Ok(ip) => ip,
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn test_forwarded_for_takes_first_hop() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, ClientIp("203.0.113.7".into()));
    }

    #[tokio::test]
    async fn test_falls_back_to_connect_info() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 4000))));
        assert_eq!(extract(request).await, ClientIp("192.0.2.10".into()));
    }

    #[tokio::test]
    async fn test_unknown_without_any_source() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(extract(request).await, ClientIp("unknown".into()));
    }
}
