use crate::extract::extract_links;
use crate::http::fetch_page;
use crate::normalize::normalize;
use crate::result::CrawlResult;
use crate::scope::Scope;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Called with `(depth, url)` each time a URL enters the visited set.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
}

/// Frontier and visited set of a single crawl. Owned by whoever drives the
/// traversal and lent to [`Crawler::run`].
#[derive(Debug, Default)]
pub struct CrawlState {
    frontier: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    visit_order: Vec<String>,
}

impl CrawlState {
    pub fn seeded(url: &str) -> Self {
        let mut state = Self::default();
        state.enqueue(url.to_string(), 0);
        state
    }

    pub fn enqueue(&mut self, url: String, depth: usize) {
        self.frontier.push_back(FrontierEntry { url, depth });
    }

    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        self.frontier.pop_front()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Check-and-mark. Returns `false` if `url` was already visited.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.visited.insert(url.to_string()) {
            self.visit_order.push(url.to_string());
            true
        } else {
            false
        }
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Visited URLs in discovery order.
    pub fn visited(&self) -> &[String] {
        &self.visit_order
    }
}

pub struct Crawler {
    client: Client,
    scope: Scope,
    max_depth: usize,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
    cancel: Arc<AtomicBool>,
}

impl Crawler {
    pub fn new(client: Client, scope: Scope) -> Self {
        Self {
            client,
            scope,
            max_depth: DEFAULT_MAX_DEPTH,
            workers: DEFAULT_WORKERS,
            progress_callback: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Shared flag; once set, the crawl stops at the next dequeue.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Crawls from the scope base and returns one result per visited URL.
    pub async fn crawl(&self) -> Vec<CrawlResult> {
        let mut state = CrawlState::seeded(self.scope.base());
        self.run(&mut state).await
    }

    /// Breadth-first traversal over `state`.
    ///
    /// Each BFS level is first passed through the dedup gate in queue order,
    /// then the pages of that level below the depth limit are fetched with up
    /// to `workers` requests in flight. Links found are enqueued at
    /// `depth + 1` only after the whole level has been gated.
    pub async fn run(&self, state: &mut CrawlState) -> Vec<CrawlResult> {
        info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            self.scope.base(),
            self.max_depth,
            self.workers
        );

        let mut results = Vec::new();

        while state.frontier_len() > 0 {
            let mut level = Vec::new();
            let mut cancelled = false;

            while let Some(FrontierEntry { url, depth }) = state.dequeue() {
                if self.is_cancelled() {
                    cancelled = true;
                    break;
                }

                let url = normalize(&url);
                if self.scope.is_excluded(&url) {
                    debug!("Skipping excluded {}", url);
                    continue;
                }
                if !state.mark_visited(&url) {
                    continue;
                }

                if let Some(ref callback) = self.progress_callback {
                    callback(depth, url.clone());
                }

                level.push((url, depth));
            }

            // Already reported as visited, so they are kept but not fetched.
            if cancelled {
                info!("Crawl cancelled with {} URLs visited", state.visited().len());
                results.extend(
                    level
                        .into_iter()
                        .map(|(url, depth)| CrawlResult::leaf(url, depth)),
                );
                break;
            }

            let max_depth = self.max_depth;
            let fetched: Vec<CrawlResult> = stream::iter(level)
                .map(|(url, depth)| async move {
                    if depth >= max_depth {
                        CrawlResult::leaf(url, depth)
                    } else {
                        self.expand(url, depth).await
                    }
                })
                .buffered(self.workers)
                .collect()
                .await;

            for result in fetched {
                for link in &result.links_found {
                    if !state.is_visited(link) && !self.scope.is_excluded(link) {
                        state.enqueue(link.clone(), result.depth + 1);
                    }
                }
                results.push(result);
            }
        }

        info!("Crawl complete. Visited {} pages", results.len());
        results
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Fetches `url` and pulls out its in-origin links. Any failure leaves the
    /// node with no outgoing links.
    async fn expand(&self, url: String, depth: usize) -> CrawlResult {
        let start = Instant::now();

        let page = match fetch_page(&self.client, &url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Crawl error for {}: {}", url, e);
                return CrawlResult::with_error(url, depth, e.to_string());
            }
        };

        let mut result = CrawlResult::new(url, depth);
        result.response_time = start.elapsed();
        result.status_code = Some(page.status);
        result.content_type = page.content_type.clone();

        if !page.is_success() {
            warn!("Crawl error for {}: HTTP {}", result.url, page.status);
            result.error = Some(format!("HTTP {}", page.status));
            return result;
        }

        result.links_found = extract_links(&result.url, &page.body, &self.scope);
        debug!("{} links found on {}", result.links_found.len(), result.url);
        result
    }
}
