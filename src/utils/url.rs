// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Normalize a URL to the `scheme://host[:port]/path` form used as the
/// dedup key across feeds and the sample index.
///
/// The trailing path slash is stripped and any query string, parameters,
/// or fragment are dropped, so two URLs differing only by those are the
/// same sample.
///
/// # Examples
/// ```
/// use kitjar::utils::url::normalize;
///
/// assert_eq!(
///     normalize("http://example.com/kit/login.php?id=4#top"),
///     "http://example.com/kit/login.php"
/// );
/// assert_eq!(normalize("http://example.com/x/"), normalize("http://example.com/x"));
/// ```
pub fn normalize(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            let authority = match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            let path = parsed.path().trim_end_matches('/');
            return format!("{}://{}{}", parsed.scheme(), authority, path);
        }
    }

    // Not a parseable URL with a host. Strip the query/fragment and the
    // trailing slash textually so the function stays idempotent.
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].trim_end_matches('/').to_string()
}

/// Rewrite an obfuscated scheme (`hxxp` / `hxxps`) back to its plain form.
///
/// Feeds commonly defang reported URLs this way; only the first
/// occurrence is replaced so the rest of the URL is left untouched.
pub fn deobfuscate_scheme(url: &str) -> String {
    if url.starts_with("hxxp") {
        url.replacen("hxxp", "http", 1)
    } else {
        url.to_string()
    }
}

/// Extract the host of a URL, if it has one.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        assert_eq!(
            normalize("http://evil.test/a/b/login.php?cmd=login_submit&id=1#x"),
            "http://evil.test/a/b/login.php"
        );
    }

    #[test]
    fn test_normalize_trailing_slash_equivalence() {
        assert_eq!(normalize("http://a.com/x/"), "http://a.com/x");
        assert_eq!(normalize("http://a.com/x"), "http://a.com/x");
    }

    #[test]
    fn test_normalize_idempotent() {
        for url in [
            "http://a.com/x/",
            "https://a.com:8080/x/y?q=1",
            "hxxp://defanged.test/kit/",
            "not a url at all/",
        ] {
            let once = normalize(url);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_keeps_explicit_port() {
        assert_eq!(
            normalize("http://a.com:8080/x/"),
            "http://a.com:8080/x"
        );
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize("http://a.com/"), "http://a.com");
    }

    #[test]
    fn test_deobfuscate_scheme() {
        assert_eq!(
            deobfuscate_scheme("hxxp://evil.test/kit"),
            "http://evil.test/kit"
        );
        assert_eq!(
            deobfuscate_scheme("hxxps://evil.test/kit"),
            "https://evil.test/kit"
        );
        assert_eq!(
            deobfuscate_scheme("http://evil.test/kit"),
            "http://evil.test/kit"
        );
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("http://evil.test/a/b"), Some("evil.test".to_string()));
        assert_eq!(host_of("hxxp://evil.test/a"), Some("evil.test".to_string()));
        assert_eq!(host_of("not a url"), None);
    }
}
