use std::time::Instant;

use axum::{
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::context::RequestContext;

/// Header naming the user on whose behalf the request is made.
pub const ACTOR_HEADER: &str = "x-user";

/// Attach a [`RequestContext`] and log the outcome of each request.
pub async fn context_middleware(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let ctx = actor_from_headers(req.headers());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ctx.clone());

    let started = Instant::now();
    let response = next.run(req).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), elapsed_ms, actor = ctx.actor(), "request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), elapsed_ms, actor = ctx.actor(), "request handled");
    }
    response
}

fn actor_from_headers(headers: &HeaderMap) -> RequestContext {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(RequestContext::new)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn actor_defaults_to_system() {
        let headers = HeaderMap::new();
        assert_eq!(actor_from_headers(&headers).actor(), "system");
    }

    #[test]
    fn actor_header_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("  ana  "));
        assert_eq!(actor_from_headers(&headers).actor(), "ana");
    }

    #[test]
    fn blank_actor_header_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("   "));
        assert_eq!(actor_from_headers(&headers).actor(), "system");
    }
}
