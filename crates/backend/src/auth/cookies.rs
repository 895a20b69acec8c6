//! Session cookie parsing and `Set-Cookie` construction.

use axum::http::{header, HeaderMap};

use super::types::AuthConfig;

/// Find the session token in the request's `Cookie` header(s).
pub fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for cookie_str in cookie_header.split(';') {
            if let Ok(cookie) = cookie::Cookie::parse(cookie_str.trim()) {
                if cookie.name() == cookie_name && !cookie.value().is_empty() {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }

    None
}

/// Build the `Set-Cookie` value that stores a fresh session token.
pub fn build_auth_cookie(config: &AuthConfig, value: &str) -> String {
    let max_age = config.token_duration_days * 24 * 60 * 60;
    format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}{}",
        config.cookie_name,
        value,
        max_age,
        site_attributes(config)
    )
}

/// Build the `Set-Cookie` value that removes the session token.
pub fn clear_auth_cookie(config: &AuthConfig) -> String {
    format!(
        "{}=; Path=/; HttpOnly; Max-Age=0{}",
        config.cookie_name,
        site_attributes(config)
    )
}

fn site_attributes(config: &AuthConfig) -> &'static str {
    // Browsers drop SameSite=None cookies that are not also Secure.
    if config.secure_cookies {
        "; SameSite=None; Secure"
    } else {
        "; SameSite=Lax"
    }
}
