//! Canonical URL form used for every scope and dedup comparison.

/// Strips the fragment and any trailing `/` from `url`.
///
/// All trailing slashes are removed, not just one, so that
/// `normalize(normalize(u)) == normalize(u)` holds for inputs like `a//`.
pub fn normalize(url: &str) -> String {
    let without_fragment = match url.split_once('#') {
        Some((head, _)) => head,
        None => url,
    };

    without_fragment.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fragment() {
        assert_eq!(
            normalize("https://a.test/page#section"),
            "https://a.test/page"
        );
    }

    #[test]
    fn test_strips_trailing_slash() {
        assert_eq!(normalize("https://a.test/"), "https://a.test");
        assert_eq!(normalize("https://a.test/docs/"), "https://a.test/docs");
    }

    #[test]
    fn test_fragment_then_slash() {
        assert_eq!(normalize("https://a.test/docs/#top"), "https://a.test/docs");
    }

    #[test]
    fn test_keeps_query() {
        assert_eq!(
            normalize("https://a.test/search?q=1#results"),
            "https://a.test/search?q=1"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://a.test",
            "https://a.test/",
            "https://a.test//",
            "https://a.test/x/#/y/",
            "https://a.test/?q=a",
            "",
            "#only-fragment",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }
}
