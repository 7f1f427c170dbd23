//! URL decoding and normalization for rule matching.
//!
//! Search result anchors frequently point at a redirect wrapper instead of
//! the target site, so the raw href is unwrapped before any rule sees it.
//! Every function here is total: malformed input degrades to the original
//! string or `None`, it never raises.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Base origin used to resolve scheme-relative and path-only hrefs.
const BASE_ORIGIN: &str = "https://www.google.com";

/// Redirect query parameters carrying the real target, most specific first.
const REDIRECT_PARAMS: [&str; 4] = ["q", "url", "imgurl", "imgrefurl"];

static BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse(BASE_ORIGIN).expect("base origin is a valid URL"));

static GOOGLE_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|\.)google\.").expect("host pattern is a valid regex"));

/// Parse a raw href, resolving relative forms against the base origin.
pub fn parse_url(raw: &str) -> Option<Url> {
    if raw.is_empty() {
        return None;
    }
    Url::options().base_url(Some(&*BASE_URL)).parse(raw).ok()
}

/// True for `google.com` and any of its country or subdomain variants.
pub fn is_google_host(host: &str) -> bool {
    GOOGLE_HOST.is_match(host)
}

/// Unwrap a search-engine redirect URL.
///
/// Non-Google URLs pass through in canonical form. Unparsable input comes
/// back unchanged so the caller can still run substring rules against it.
pub fn decode_google_url(raw: &str) -> String {
    let url = match parse_url(raw) {
        Some(url) => url,
        None => return raw.to_string(),
    };

    if !is_google_host(url.host_str().unwrap_or("")) {
        return url.into();
    }

    for key in REDIRECT_PARAMS {
        let target = url
            .query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned());
        if let Some(target) = target {
            if !target.is_empty() {
                return target;
            }
        }
    }

    url.into()
}

/// Canonical absolute URL string used as the matching basis.
pub fn normalize_for_match(raw: &str) -> Option<String> {
    let decoded = decode_google_url(raw);
    parse_url(&decoded).map(String::from)
}

/// Lowercase hostname of the decoded URL.
pub fn normalize_host(raw: &str) -> Option<String> {
    let decoded = decode_google_url(raw);
    let url = parse_url(&decoded)?;
    url.host_str().map(str::to_string)
}

/// Hostname of a page URL, empty string when unparsable.
pub fn domain_of(raw: &str) -> String {
    parse_url(raw)
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default()
}
