//! URL utility functions

use url::Url;

/// Parse URL and extract components
pub fn parse_url(url_str: &str) -> Result<Url, url::ParseError> {
    Url::parse(url_str)
}

/// Extract the host portion of a URL string, if it has one
pub fn extract_host(url_str: &str) -> Option<String> {
    parse_url(url_str)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
}

/// Check if URL uses a plain web scheme (http or https)
pub fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
