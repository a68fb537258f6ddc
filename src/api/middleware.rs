//! API Middleware
//!
//! Operation context extraction and request logging.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::OperationContext;

/// Header carrying the caller identity asserted by an upstream gateway
pub const INVOKER_HEADER: &str = "x-invoker";
/// Header carrying the request correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
/// Response header echoing the transaction id assigned to the request
pub const TX_ID_HEADER: &str = "x-tx-id";

// =========================================================================
// Operation context
// =========================================================================

/// Build the operation context for a request.
///
/// Each request gets a fresh transaction id, which also serves as the
/// reference number when the body does not supply one.
pub fn context_from_headers(headers: &HeaderMap) -> OperationContext {
    let correlation_id = headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let context = OperationContext::generate().with_correlation_id(correlation_id);

    match headers
        .get(INVOKER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    {
        Some(invoker) => context.with_invoker(invoker),
        None => context,
    }
}

/// Attach an [`OperationContext`] to the request and echo its ids back
pub async fn context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let context = context_from_headers(request.headers());
    let tx_id = context.tx_id.clone();
    let correlation_id = context.correlation_id;

    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&tx_id) {
        headers.insert(TX_ID_HEADER, value);
    }
    if let Some(value) = correlation_id.and_then(|id| HeaderValue::from_str(&id.to_string()).ok())
    {
        headers.insert(CORRELATION_ID_HEADER, value);
    }

    response
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware; runs inside [`context_middleware`]
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let (tx_id, correlation_id) = request
        .extensions()
        .get::<OperationContext>()
        .map(|ctx| (Some(ctx.tx_id.clone()), ctx.correlation_id))
        .unwrap_or((None, None));

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        tx_id = ?tx_id,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        tx_id = ?tx_id,
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
