use super::outcome::{Error, LongUrl};
use regex::bytes::Regex;
use url::Url;

/// Helpers for pulling URLs out of interstitial HTML pages.
pub mod html {
    use super::{Error, LongUrl, Regex};

    lazy_static::lazy_static! {
        static ref CHAR_REF_RE: regex::Regex =
            regex::Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z][A-Za-z0-9]{0,31});").unwrap();
    }

    pub fn contains(body: &[u8], needle: &str) -> bool {
        !needle.is_empty() && memchr::memmem::find(body, needle.as_bytes()).is_some()
    }

    /// Return the first capture group of `pattern` as UTF-8 text.
    pub fn capture<'a>(pattern: &Regex, body: &'a [u8]) -> Option<Result<&'a str, Error>> {
        pattern.captures(body).and_then(|captures| captures.get(1)).map(|group| {
            std::str::from_utf8(group.as_bytes())
                .map_err(|_| Error::service("Invalid UTF-8 in target URL"))
        })
    }

    /// Decode `;`-terminated character references.
    ///
    /// Anything else, including a bare `&name` in a query string, is kept
    /// as it is, as are references that do not name a character.
    pub fn unescape(value: &str) -> String {
        CHAR_REF_RE
            .replace_all(value, |captures: &regex::Captures| {
                let reference = &captures[1];

                decode_reference(reference).unwrap_or_else(|| captures[0].to_string())
            })
            .into_owned()
    }

    fn decode_reference(reference: &str) -> Option<String> {
        if let Some(number) = reference.strip_prefix('#') {
            let code_point = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };

            char::from_u32(code_point).map(String::from)
        } else {
            decode_named(reference)
        }
    }

    /// Named references go through the HTML parser one at a time, so the
    /// reference is the whole fragment. A result longer than two characters
    /// means only a prefix of the name matched.
    fn decode_named(name: &str) -> Option<String> {
        let fragment = format!("&{};", name);
        let decoded = scraper::Html::parse_fragment(&fragment)
            .root_element()
            .text()
            .collect::<String>();

        if decoded != fragment && decoded.chars().count() <= 2 {
            Some(decoded)
        } else {
            None
        }
    }

    /// Capture the target URL from a page, or fail with `missing`.
    pub fn extract_url(pattern: &Regex, body: &[u8], missing: &str) -> Result<LongUrl, Error> {
        let raw = capture(pattern, body).ok_or_else(|| Error::service(missing))??;

        Ok(LongUrl::from(unescape(raw)))
    }
}

/// Helpers for validating redirect URLs that embed the real target.
pub mod query {
    use super::{Error, Url};

    pub fn parse(value: &[u8], context: &str) -> Result<Url, Error> {
        std::str::from_utf8(value)
            .ok()
            .and_then(|value| Url::parse(value).ok())
            .ok_or_else(|| Error::service(format!("Unexpected {}", context)))
    }

    /// The value of a parameter that must appear exactly once with a
    /// non-empty value.
    pub fn single(url: &Url, key: &str) -> Option<String> {
        let mut values = url
            .query_pairs()
            .filter(|(name, value)| name == key && !value.is_empty())
            .map(|(_, value)| value.into_owned());

        match (values.next(), values.next()) {
            (Some(value), None) => Some(value),
            _ => None,
        }
    }

    /// Whether `url` is `http://{host}{path}` with no explicit port.
    pub fn is_location(url: &Url, host: &str, path: &str) -> bool {
        url.scheme() == "http"
            && url.host_str() == Some(host)
            && url.port().is_none()
            && url.path() == path
    }
}

#[cfg(test)]
mod tests {
    use super::{html, query};
    use regex::bytes::Regex;

    #[test]
    fn unescape_entities() {
        assert_eq!(
            html::unescape("http://example.org/?a=1&amp;b=2&#38;c=&quot;3&quot;"),
            "http://example.org/?a=1&b=2&c=\"3\""
        );
        assert_eq!(html::unescape("http://example.org/"), "http://example.org/");
        assert_eq!(html::unescape("a&#x3C;b&lt;c&gt;"), "a<b<c>");
    }

    #[test]
    fn unescape_keeps_bare_ampersands() {
        assert_eq!(
            html::unescape("http://example.org/?a=1&region=us"),
            "http://example.org/?a=1&region=us"
        );
        assert_eq!(
            html::unescape("http://example.org/?a=1&copy=2&not=3&lt=4"),
            "http://example.org/?a=1&copy=2&not=3&lt=4"
        );
        assert_eq!(
            html::unescape("http://example.org/?a=1&amp;region=us"),
            "http://example.org/?a=1&region=us"
        );
        assert_eq!(html::unescape("x<y>&z"), "x<y>&z");
    }

    #[test]
    fn unescape_keeps_unknown_references() {
        assert_eq!(html::unescape("a&nosuchentity;b"), "a&nosuchentity;b");
        assert_eq!(html::unescape("a&notit;b"), "a&notit;b");
        assert_eq!(html::unescape("a&#xffffffff;b"), "a&#xffffffff;b");
    }

    #[test]
    fn extract_url_from_page() {
        let pattern = Regex::new(r#"<a href="(.*?)">"#).unwrap();
        let body = br#"<p><a href="http://example.org/?x=1&amp;y=2">go</a></p>"#;

        assert_eq!(
            html::extract_url(&pattern, body, "missing").unwrap(),
            "http://example.org/?x=1&y=2"
        );
        assert_eq!(
            html::extract_url(&pattern, b"<p>nothing</p>", "missing").unwrap_err(),
            crate::outcome::Error::service("missing")
        );
    }

    #[test]
    fn contains_needle() {
        assert!(html::contains(b"<title>Redirecting...</title>", "Redirecting"));
        assert!(!html::contains(b"", "x"));
        assert!(!html::contains(b"abc", ""));
        assert!(html::contains(b"\xffUndefined index", "Undefined index"));
    }

    #[test]
    fn single_query_values() {
        let url = url::Url::parse("http://bit.ly/a/warning?hash=abc&url=&x=1&x=2").unwrap();

        assert_eq!(query::single(&url, "hash"), Some("abc".to_string()));
        assert_eq!(query::single(&url, "url"), None);
        assert_eq!(query::single(&url, "x"), None);
        assert!(query::is_location(&url, "bit.ly", "/a/warning"));
    }
}
