use crate::error::{Result, ScanError};
use crate::normalize::normalize;
use std::collections::HashSet;
use url::Url;

/// The origin prefix a scan is confined to, plus URLs it must never touch.
#[derive(Debug, Clone)]
pub struct Scope {
    base: String,
    excluded: HashSet<String>,
}

impl Scope {
    pub fn new<I, S>(base: &str, excluded: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed =
            Url::parse(base).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                base,
                parsed.scheme()
            )));
        }

        Ok(Self {
            base: normalize(parsed.as_str()),
            excluded: excluded
                .into_iter()
                .map(|url| canonicalize(url.as_ref()))
                .filter(|url| !url.is_empty())
                .collect(),
        })
    }

    /// Normalized base URL; also the crawl seed.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    /// Prefix check only. `url` must already be normalized.
    pub fn in_origin(&self, url: &str) -> bool {
        url.starts_with(&self.base)
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.excluded.contains(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.in_origin(url) && !self.is_excluded(url)
    }
}

/// Serializes through `Url` when possible so that case and default ports
/// match the form links are resolved to.
fn canonicalize(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(parsed) => normalize(parsed.as_str()),
        Err(_) => normalize(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_is_normalized() {
        let scope = Scope::new("https://a.test/", Vec::<String>::new()).unwrap();
        assert_eq!(scope.base(), "https://a.test");
    }

    #[test]
    fn test_exclusions_are_normalized() {
        let scope = Scope::new("https://a.test", ["https://a.test/logout/", "  "]).unwrap();
        assert!(scope.is_excluded("https://a.test/logout"));
        assert_eq!(scope.excluded().len(), 1);
    }

    #[test]
    fn test_contains() {
        let scope = Scope::new("https://a.test", ["https://a.test/logout"]).unwrap();
        assert!(scope.contains("https://a.test/x"));
        assert!(!scope.contains("https://a.test/logout"));
        assert!(!scope.contains("https://other.test/y"));
    }

    #[test]
    fn test_mixed_case_and_default_port_canonicalized() {
        let scope = Scope::new(
            "HTTPS://A.Test:443/",
            ["https://a.TEST:443/logout", "HTTP://a.test:80/admin/"],
        )
        .unwrap();

        assert_eq!(scope.base(), "https://a.test");
        assert!(scope.contains("https://a.test/x"));
        assert!(scope.is_excluded("https://a.test/logout"));
        assert!(scope.is_excluded("http://a.test/admin"));
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(matches!(
            Scope::new("not a url", Vec::<String>::new()),
            Err(ScanError::InvalidUrl(_))
        ));
        assert!(Scope::new("ftp://a.test", Vec::<String>::new()).is_err());
    }
}
