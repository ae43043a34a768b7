use crate::extract::{Form, FormMethod, extract_forms};
use crate::http::fetch_page;
use crate::inject::{InjectionRequest, XSS_PAYLOAD, inject_form, inject_url};
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// An injectable point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Surface {
    Url { url: String },
    Form { page: String, form: Form },
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Url { url } => write!(f, "URL {}", url),
            Surface::Form { page, form } => {
                write!(f, "{} form -> {} on {}", form.method, form.action, page)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub surface: Surface,
    pub payload_reflected: bool,
    /// `None` when no request was sent.
    pub request: Option<InjectionRequest>,
}

/// Literal substring test. Escaped reflections are deliberately not matched.
pub fn is_reflected(body: &str, payload: &str) -> bool {
    !payload.is_empty() && body.contains(payload)
}

/// Sends injected requests and checks the response body for the payload.
/// Holds no per-scan state.
#[derive(Clone)]
pub struct Prober {
    client: Client,
    payload: String,
}

impl Prober {
    pub fn new(client: Client) -> Self {
        Self::with_payload(client, XSS_PAYLOAD)
    }

    pub fn with_payload(client: Client, payload: &str) -> Self {
        Self {
            client,
            payload: payload.to_string(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Fetches `page_url` and returns its forms. Any failure yields none.
    pub async fn discover_forms(&self, page_url: &str) -> Vec<Form> {
        match fetch_page(&self.client, page_url).await {
            Ok(page) => extract_forms(page_url, &page.body),
            Err(e) => {
                warn!("Could not fetch forms from {}: {}", page_url, e);
                Vec::new()
            }
        }
    }

    pub async fn probe_form(&self, page_url: &str, form: Form) -> ProbeResult {
        let request = inject_form(&form, &self.payload);
        let payload_reflected = self.send(&request).await;

        ProbeResult {
            surface: Surface::Form {
                page: page_url.to_string(),
                form,
            },
            payload_reflected,
            request: Some(request),
        }
    }

    /// URLs without query parameters are answered without any request.
    pub async fn probe_url(&self, url: &str) -> ProbeResult {
        let surface = Surface::Url {
            url: url.to_string(),
        };

        let Some(request) = inject_url(url, &self.payload) else {
            debug!("{} has no query parameters, skipping", url);
            return ProbeResult {
                surface,
                payload_reflected: false,
                request: None,
            };
        };

        let payload_reflected = self.send(&request).await;
        ProbeResult {
            surface,
            payload_reflected,
            request: Some(request),
        }
    }

    /// Transport failures count as not reflected. Error statuses are still
    /// checked, since error pages often echo input.
    async fn send(&self, request: &InjectionRequest) -> bool {
        let builder = match request.method {
            FormMethod::Get if request.params.is_empty() => self.client.get(&request.url),
            FormMethod::Get => self.client.get(&request.url).query(&request.params),
            FormMethod::Post => self.client.post(&request.url).form(&request.params),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Probe request to {} failed: {}", request.url, e);
                return false;
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => {
                debug!("Probe {} {} -> {}", request.method, request.url, status);
                is_reflected(&body, &self.payload)
            }
            Err(e) => {
                warn!("Failed to read probe response from {}: {}", request.url, e);
                false
            }
        }
    }
}
