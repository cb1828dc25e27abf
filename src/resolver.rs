//! Turns hrefs found on a page into absolute, fetchable URLs.

use crate::error::SpiderError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Bytes left as they are in a relative href. Everything else, `%`
/// included, is percent-encoded.
const HREF_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Resolves `href` against the URL of the page it was found on.
///
/// An href that is already an absolute URL with a host is returned
/// unchanged. Any other href is percent-encoded and joined onto `base`, so
/// the result inherits the base's scheme, host and port. Reachability is
/// not checked.
pub fn resolve(base: &Url, href: &str) -> Result<Url, SpiderError> {
    if let Ok(absolute) = Url::parse(href) {
        if absolute.has_host() {
            return Ok(absolute);
        }
    }
    let encoded = utf8_percent_encode(href, HREF_ENCODE_SET).to_string();
    Ok(base.join(&encoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.urparts.com/index.cfm/page/catalogue").unwrap()
    }

    #[test]
    fn joins_root_relative_paths() {
        let url = resolve(&base(), "/index.cfm/page/catalogue/Atlas-Copco").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.urparts.com/index.cfm/page/catalogue/Atlas-Copco"
        );
    }

    #[test]
    fn joins_document_relative_paths() {
        let url = resolve(&base(), "catalogue/Doosan").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.urparts.com/index.cfm/page/catalogue/Doosan"
        );
    }

    #[test]
    fn encodes_spaces_and_percent_signs() {
        let url = resolve(&base(), "/parts/Atlas Copco/50%").unwrap();
        assert_eq!(url.path(), "/parts/Atlas%20Copco/50%25");
    }

    #[test]
    fn encodes_query_delimiters_in_relative_hrefs() {
        let url = resolve(&base(), "/search?q=a&b").unwrap();
        assert_eq!(url.path(), "/search%3Fq%3Da%26b");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn keeps_absolute_urls() {
        let url = resolve(&base(), "https://shop.example.com/a b").unwrap();
        assert_eq!(url.host_str(), Some("shop.example.com"));
        assert_eq!(url.path(), "/a%20b");
    }

    #[test]
    fn inherits_scheme_host_and_port() {
        let base = Url::parse("http://localhost:8080/a/b").unwrap();
        let url = resolve(&base, "c/d").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.path(), "/a/c/d");
    }
}
