//! Server-to-server authentication.
//!
//! In production the GraphQL endpoint only accepts persisted operation ids;
//! raw query text is reserved for callers holding the server PSK. The PSK
//! check uses constant-time comparison to mitigate timing attacks.

use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

/// Header name for the server PSK.
pub const SERVER_AUTH_HEADER: &str = "x-server-auth";

/// Check whether the request carries the server PSK, either in the dedicated
/// header or as a bearer token. Returns false when no PSK is configured.
pub fn check_server_auth(headers: &HeaderMap, expected_psk: Option<&str>) -> bool {
    let Some(expected) = expected_psk else {
        return false;
    };

    let provided = headers
        .get(SERVER_AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        });

    match provided {
        Some(provided_key) => constant_time_compare(provided_key, expected),
        None => false,
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_server_auth_header() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER_AUTH_HEADER, "secret".parse().unwrap());
        assert!(check_server_auth(&headers, Some("secret")));
        assert!(!check_server_auth(&headers, Some("other")));
        assert!(!check_server_auth(&headers, None));
    }

    #[test]
    fn test_server_auth_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
        assert!(check_server_auth(&headers, Some("secret")));
        assert!(!check_server_auth(&HeaderMap::new(), Some("secret")));
    }
}
