//! HTTP utility functions

/// Extract the `name=value` pair from a Set-Cookie value, dropping attributes
/// like Path, Expires and HttpOnly.
pub fn cookie_name_value(set_cookie: &str) -> Option<(String, String)> {
    let pair = set_cookie.split(';').next()?.trim();
    let eq_pos = pair.find('=')?;
    let name = pair[..eq_pos].trim();
    if name.is_empty() {
        return None;
    }
    let value = pair[eq_pos + 1..].trim();
    Some((name.to_string(), value.to_string()))
}

/// Serialize cookie pairs as a single `Cookie` request header value
pub fn join_cookie_header(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
