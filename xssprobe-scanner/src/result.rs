use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One entry of the visited set, in the order it was discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub depth: usize,
    /// `false` for leaves at the depth limit; those are never fetched.
    pub expanded: bool,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub links_found: Vec<String>,
    pub error: Option<String>,
}

impl CrawlResult {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            depth,
            expanded: true,
            status_code: None,
            content_type: None,
            response_time: Duration::from_secs(0),
            links_found: Vec::new(),
            error: None,
        }
    }

    pub fn leaf(url: String, depth: usize) -> Self {
        Self {
            expanded: false,
            ..Self::new(url, depth)
        }
    }

    pub fn with_error(url: String, depth: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, depth)
        }
    }
}
