use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use super::api::{error_response, ApiError};

/// Request validation middleware.
///
/// Bodies on write methods must be JSON and no larger than `max_request_size`.
/// Bodiless writes such as cart clear or checkout pass through.
pub async fn request_validation_middleware(
    max_request_size: usize,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let content_length = content_length(&request);

    validate_request_size(content_length, max_request_size)?;
    validate_content_type(&request, content_length)?;

    Ok(next.run(request).await)
}

fn content_length(request: &Request<Body>) -> Option<u64> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
}

fn carries_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

/// Validate content type for requests with body
fn validate_content_type(
    request: &Request<Body>,
    content_length: Option<u64>,
) -> Result<(), ApiError> {
    if !carries_body(request.method()) || content_length.unwrap_or(0) == 0 {
        return Ok(());
    }

    match request.headers().get(header::CONTENT_TYPE) {
        Some(content_type) => {
            let content_type = content_type.to_str().unwrap_or("");
            if content_type.starts_with("application/json") {
                Ok(())
            } else {
                warn!("Invalid content type: {}", content_type);
                Err(error_response(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "Content-Type must be application/json",
                ))
            }
        }
        None => {
            warn!("Missing content type header");
            Err(error_response(
                StatusCode::BAD_REQUEST,
                "Content-Type header is required for requests with body",
            ))
        }
    }
}

fn validate_request_size(
    content_length: Option<u64>,
    max_request_size: usize,
) -> Result<(), ApiError> {
    match content_length {
        Some(length) if length > max_request_size as u64 => {
            error!("Request too large: {} bytes", length);
            Err(error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Request size {} bytes exceeds maximum of {} bytes",
                    length, max_request_size
                ),
            ))
        }
        _ => Ok(()),
    }
}

const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("content-security-policy", "default-src 'self'"),
];

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    response
}
