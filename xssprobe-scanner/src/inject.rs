//! Builds injected requests for the two surface shapes: forms and URLs
//! carrying a query string.

use crate::extract::{Form, FormMethod};
use serde::Serialize;
use url::Url;

/// Marker payload. Its verbatim presence in a response proves unescaped
/// reflection.
pub const XSS_PAYLOAD: &str = "<script>alert('XSS')</script>";

/// Fully formed request carrying the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionRequest {
    pub url: String,
    pub method: FormMethod,
    /// Sent as the query string for GET and as a urlencoded body for POST.
    pub params: Vec<(String, String)>,
}

/// Puts `payload` into every text-like field; every other field keeps its
/// default value.
pub fn inject_form(form: &Form, payload: &str) -> InjectionRequest {
    let params = form
        .fields
        .iter()
        .map(|field| {
            let value = if field.is_text_like() {
                payload.to_string()
            } else {
                field.value.clone()
            };
            (field.name.clone(), value)
        })
        .collect();

    InjectionRequest {
        url: form.action.clone(),
        method: form.method,
        params,
    }
}

/// Replaces the value of every query parameter with `payload`.
///
/// Returns `None` for URLs without a `?` or whose query holds no parameters;
/// those are not a surface.
pub fn inject_url(url: &str, payload: &str) -> Option<InjectionRequest> {
    if !url.contains('?') {
        return None;
    }

    let mut parsed = Url::parse(url).ok()?;
    let names: Vec<String> = parsed.query_pairs().map(|(name, _)| name.into_owned()).collect();
    if names.is_empty() {
        return None;
    }

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(names.iter().map(|name| (name.as_str(), payload)));

    Some(InjectionRequest {
        url: parsed.to_string(),
        method: FormMethod::Get,
        params: Vec::new(),
    })
}
