//! Cookie bridging between the embedding surface's store and outbound fetches
//!
//! The outbound transport and the embedding surface's in-process browser
//! engine do not share a cookie jar. Without this bridge, login sessions
//! established inside the embedded frame would not reach subsequent relayed
//! document loads. Both directions are best-effort: cookie work never fails
//! the relay path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

use crate::models::RawOriginResponse;
use crate::utils::{cookie_name_value, extract_host, join_cookie_header};

/// Cookie store exposed by the embedding surface.
///
/// Assumed thread-safe; last write wins per cookie name, per normal
/// cookie-jar semantics delegated to the store.
pub trait CookieStore: Send + Sync {
    /// All cookies held for `url`, serialized as a single `Cookie` header
    /// value, or `None` when the store holds nothing for it.
    fn cookies_for_url(&self, url: &str) -> Option<String>;

    /// Write one `Set-Cookie` value against `url`.
    fn set_cookie(&self, url: &str, cookie: &str);
}

/// Bidirectional cookie propagation over a [`CookieStore`].
pub struct CookieBridge {
    store: Arc<dyn CookieStore>,
}

impl CookieBridge {
    pub fn new(store: Arc<dyn CookieStore>) -> Self {
        Self { store }
    }

    /// Cookies to send with the outbound fetch for `url`.
    pub fn outbound_cookies(&self, url: &str) -> Option<String> {
        self.store
            .cookies_for_url(url)
            .filter(|cookies| !cookies.is_empty())
    }

    /// Write every `Set-Cookie` value the origin returned into the store, in
    /// origin order.
    pub fn apply_response_cookies(&self, url: &str, origin: &RawOriginResponse) {
        for cookie in origin.header_values("set-cookie") {
            trace!("🍪 Storing cookie for {}: {}", url, cookie);
            self.store.set_cookie(url, cookie);
        }
    }
}

/// In-process cookie store keyed by URL host.
///
/// Insertion-ordered with last-write-wins per cookie name. Serves hosts that
/// have no native store, and the test suite.
#[derive(Default)]
pub struct MemoryCookieStore {
    jars: Mutex<HashMap<String, Vec<(String, String)>>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn cookies_for_url(&self, url: &str) -> Option<String> {
        let host = extract_host(url)?;
        let jars = self.jars.lock().unwrap_or_else(|e| e.into_inner());
        let jar = jars.get(&host)?;
        if jar.is_empty() {
            return None;
        }
        Some(join_cookie_header(jar))
    }

    fn set_cookie(&self, url: &str, cookie: &str) {
        let Some(host) = extract_host(url) else {
            return;
        };
        let Some((name, value)) = cookie_name_value(cookie) else {
            return;
        };

        let mut jars = self.jars.lock().unwrap_or_else(|e| e.into_inner());
        let jar = jars.entry(host).or_default();
        match jar.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => jar.push((name, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/login";

    #[test]
    fn test_empty_store_yields_no_cookie_header() {
        let store = MemoryCookieStore::new();
        assert_eq!(store.cookies_for_url(URL), None);

        let bridge = CookieBridge::new(Arc::new(store));
        assert_eq!(bridge.outbound_cookies(URL), None);
    }

    #[test]
    fn test_cookies_serialize_in_insertion_order() {
        let store = MemoryCookieStore::new();
        store.set_cookie(URL, "a=1; Path=/; HttpOnly");
        store.set_cookie(URL, "b=2");

        assert_eq!(store.cookies_for_url(URL), Some("a=1; b=2".to_string()));
    }

    #[test]
    fn test_last_write_wins_per_cookie_name() {
        let store = MemoryCookieStore::new();
        store.set_cookie(URL, "session=old");
        store.set_cookie(URL, "theme=dark");
        store.set_cookie(URL, "session=new");

        assert_eq!(
            store.cookies_for_url(URL),
            Some("session=new; theme=dark".to_string())
        );
    }

    #[test]
    fn test_cookies_are_scoped_by_host() {
        let store = MemoryCookieStore::new();
        store.set_cookie("https://a.example.com/", "a=1");

        assert_eq!(store.cookies_for_url("https://b.example.com/"), None);
        assert_eq!(
            store.cookies_for_url("https://a.example.com/other/path"),
            Some("a=1".to_string())
        );
    }

    #[test]
    fn test_bridge_applies_set_cookie_values_in_origin_order() {
        let origin = RawOriginResponse::without_body(
            200,
            "OK",
            vec![
                ("Set-Cookie".to_string(), "a=1".to_string()),
                ("Set-Cookie".to_string(), "b=2".to_string()),
                ("Set-Cookie".to_string(), "a=3".to_string()),
            ],
        );

        let store = Arc::new(MemoryCookieStore::new());
        let bridge = CookieBridge::new(store.clone());
        bridge.apply_response_cookies(URL, &origin);

        // a written first, then b, then a overwritten in place
        assert_eq!(store.cookies_for_url(URL), Some("a=3; b=2".to_string()));
    }

    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<(String, String)>>,
    }

    impl CookieStore for RecordingStore {
        fn cookies_for_url(&self, _url: &str) -> Option<String> {
            None
        }

        fn set_cookie(&self, url: &str, cookie: &str) {
            self.writes
                .lock()
                .unwrap()
                .push((url.to_string(), cookie.to_string()));
        }
    }

    #[test]
    fn test_bridge_issues_one_write_per_set_cookie_value() {
        let origin = RawOriginResponse::without_body(
            200,
            "OK",
            vec![
                ("Set-Cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
        );

        let store = Arc::new(RecordingStore::default());
        let bridge = CookieBridge::new(store.clone());
        bridge.apply_response_cookies(URL, &origin);

        let writes = store.writes.lock().unwrap();
        assert_eq!(
            *writes,
            vec![
                (URL.to_string(), "a=1".to_string()),
                (URL.to_string(), "b=2".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_set_cookie_is_ignored() {
        let store = MemoryCookieStore::new();
        store.set_cookie(URL, "definitely not a cookie");
        assert_eq!(store.cookies_for_url(URL), None);
    }
}
