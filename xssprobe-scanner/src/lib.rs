pub mod crawler;
pub mod error;
pub mod extract;
pub mod http;
pub mod inject;
pub mod normalize;
pub mod probe;
pub mod result;
pub mod scope;

pub use crawler::{CrawlState, Crawler, FrontierEntry, ProgressCallback};
pub use error::ScanError;
pub use extract::{Form, FormField, FormMethod, extract_forms, extract_links};
pub use http::{Page, build_client, fetch_page};
pub use inject::{InjectionRequest, XSS_PAYLOAD, inject_form, inject_url};
pub use normalize::normalize;
pub use probe::{ProbeResult, Prober, Surface, is_reflected};
pub use result::CrawlResult;
pub use scope::Scope;
