//! Link and form extraction from fetched HTML.
//!
//! Parsing is permissive: broken markup yields fewer results, never an error.

use crate::normalize::normalize;
use crate::scope::Scope;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("static selector"));
static FIELD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input, textarea, select").expect("static selector"));
static OPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("option").expect("static selector"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    /// Anything other than `post` (any case) falls back to `get`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|m| m.trim().to_ascii_lowercase()) {
            Some(m) if m == "post" => FormMethod::Post,
            _ => FormMethod::Get,
        }
    }
}

impl fmt::Display for FormMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormMethod::Get => write!(f, "GET"),
            FormMethod::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    /// Lowercased `type` attribute; `None` when the markup omits it.
    pub input_type: Option<String>,
    pub value: String,
}

impl FormField {
    /// Fields a user could type into. These receive the payload.
    pub fn is_text_like(&self) -> bool {
        match self.input_type.as_deref() {
            None => true,
            Some(t) => matches!(t, "text" | "search" | "textarea"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub action: String,
    pub method: FormMethod,
    pub fields: Vec<FormField>,
}

/// Returns same-origin links from `html` in document order, normalized and
/// deduplicated. Links outside `scope`'s origin are dropped here; exclusions
/// are left to the crawler.
pub fn extract_links(page_url: &str, html: &str, scope: &Scope) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        debug!("Cannot resolve links against {}", page_url);
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_href(&base, href) else {
            continue;
        };

        let link = normalize(&absolute);
        if !scope.in_origin(&link) {
            debug!("  -> {} is off-origin, skipping", link);
            continue;
        }
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Returns every form on the page with its action resolved to an absolute
/// URL. Nameless fields are dropped since they never reach the server.
pub fn extract_forms(page_url: &str, html: &str) -> Vec<Form> {
    let Ok(base) = Url::parse(page_url) else {
        debug!("Cannot resolve form actions against {}", page_url);
        return Vec::new();
    };

    let document = Html::parse_document(html);

    document
        .select(&FORM_SELECTOR)
        .map(|form| {
            let action = form
                .value()
                .attr("action")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .and_then(|a| base.join(a).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| page_url.to_string());

            let fields = form.select(&FIELD_SELECTOR).filter_map(read_field).collect();

            Form {
                action,
                method: FormMethod::parse(form.value().attr("method")),
                fields,
            }
        })
        .collect()
}

fn read_field(element: ElementRef<'_>) -> Option<FormField> {
    let name = element.value().attr("name").filter(|n| !n.is_empty())?;

    let (input_type, value) = match element.value().name() {
        "textarea" => (
            Some("textarea".to_string()),
            element.text().collect::<String>(),
        ),
        "select" => (Some("select".to_string()), selected_option(element)),
        _ => (
            element
                .value()
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty()),
            element.value().attr("value").unwrap_or_default().to_string(),
        ),
    };

    Some(FormField {
        name: name.to_string(),
        input_type,
        value,
    })
}

fn selected_option(select: ElementRef<'_>) -> String {
    let options: Vec<ElementRef<'_>> = select.select(&OPTION_SELECTOR).collect();
    let chosen = options
        .iter()
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| options.first());

    match chosen {
        Some(option) => option
            .value()
            .attr("value")
            .map(|v| v.to_string())
            .unwrap_or_else(|| option.text().collect::<String>().trim().to_string()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new("https://a.test", Vec::<String>::new()).unwrap()
    }

    #[test]
    fn test_links_resolved_and_filtered() {
        let html = r##"
            <html><body>
                <a href="/x">X</a>
                <a href="https://other.test/y">Other</a>
                <a href="docs/#intro">Docs</a>
                <a href="mailto:admin@a.test">Mail</a>
                <a href="javascript:void(0)">JS</a>
                <a href="/x#again">X again</a>
            </body></html>
        "##;

        let links = extract_links("https://a.test/", html, &scope());
        assert_eq!(links, vec!["https://a.test/x", "https://a.test/docs"]);
    }

    #[test]
    fn test_links_keep_query_strings() {
        let html = r#"<a href="/search?q=shoes&page=2">s</a>"#;
        let links = extract_links("https://a.test", html, &scope());
        assert_eq!(links, vec!["https://a.test/search?q=shoes&page=2"]);
    }

    #[test]
    fn test_links_from_malformed_html() {
        let html = r#"<div><a href="/one">one<p><a href='/two'>two</div></body"#;
        let links = extract_links("https://a.test", html, &scope());
        assert_eq!(links, vec!["https://a.test/one", "https://a.test/two"]);
    }

    #[test]
    fn test_links_from_non_html_body() {
        assert!(extract_links("https://a.test", "{\"json\": true}", &scope()).is_empty());
    }

    #[test]
    fn test_form_defaults() {
        let html = r#"<form><input type="text" name="q"></form>"#;
        let forms = extract_forms("https://a.test/search", html);

        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].action, "https://a.test/search");
        assert_eq!(forms[0].method, FormMethod::Get);
    }

    #[test]
    fn test_form_action_and_method() {
        let html = r#"
            <form action="/login" method="POST">
                <input type="text" name="user">
                <input type="password" name="pass">
                <input type="hidden" name="csrf" value="abc123">
                <input type="submit" value="Go">
            </form>
        "#;
        let forms = extract_forms("https://a.test/account/", html);

        assert_eq!(forms[0].action, "https://a.test/login");
        assert_eq!(forms[0].method, FormMethod::Post);

        let names: Vec<&str> = forms[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["user", "pass", "csrf"]);
        assert_eq!(forms[0].fields[2].value, "abc123");
        assert_eq!(forms[0].fields[2].input_type.as_deref(), Some("hidden"));
    }

    #[test]
    fn test_form_textarea_and_select() {
        let html = r#"
            <form action="comment.php" method="post">
                <textarea name="body">hello</textarea>
                <select name="topic">
                    <option value="a">A</option>
                    <option value="b" selected>B</option>
                </select>
                <input name="untyped">
            </form>
        "#;
        let forms = extract_forms("https://a.test/blog/post", html);
        let fields = &forms[0].fields;

        assert_eq!(forms[0].action, "https://a.test/blog/comment.php");
        assert_eq!(fields[0].value, "hello");
        assert!(fields[0].is_text_like());
        assert_eq!(fields[1].value, "b");
        assert!(!fields[1].is_text_like());
        assert_eq!(fields[2].input_type, None);
        assert!(fields[2].is_text_like());
    }

    #[test]
    fn test_unknown_method_falls_back_to_get() {
        assert_eq!(FormMethod::parse(Some("PUT")), FormMethod::Get);
        assert_eq!(FormMethod::parse(Some(" Post ")), FormMethod::Post);
        assert_eq!(FormMethod::parse(None), FormMethod::Get);
    }

    #[test]
    fn test_no_forms() {
        assert!(extract_forms("https://a.test", "<p>nothing here</p>").is_empty());
    }
}
