//! Two-phase scan: crawl the target, then probe every visited page.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;
use xssprobe_scanner::crawler::{DEFAULT_MAX_DEPTH, DEFAULT_WORKERS};
use xssprobe_scanner::error::Result;
use xssprobe_scanner::http::DEFAULT_TIMEOUT_SECS;
use xssprobe_scanner::{
    CrawlResult, Crawler, ProbeResult, Prober, Scope, XSS_PAYLOAD, build_client,
};

/// Options for configuring a scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub target: String,
    pub exclusions: Vec<String>,
    pub max_depth: usize,
    pub workers: usize,
    pub timeout_secs: u64,
    pub payload: String,
    pub show_progress_bars: bool,
}

impl ScanOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            exclusions: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            workers: DEFAULT_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            payload: XSS_PAYLOAD.to_string(),
            show_progress_bars: false,
        }
    }
}

/// Streamed to the caller while the scan runs
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Discovered { url: String, depth: usize },
    CrawlFinished { pages: usize },
    TestingForm { page: String, action: String },
    TestingUrl { url: String },
    Vulnerable(ProbeResult),
    Cancelled,
}

pub type ScanEventCallback = Arc<dyn Fn(ScanEvent) + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub max_depth: usize,
    pub pages: Vec<CrawlResult>,
    pub results: Vec<ProbeResult>,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn visited(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.url.as_str()).collect()
    }

    /// Probe results that actually sent a request.
    pub fn tested(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.request.is_some())
    }

    pub fn findings(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.payload_reflected)
    }
}

/// Forwards events to the caller, pausing the spinner while it prints.
#[derive(Clone)]
struct Emitter {
    callback: Option<ScanEventCallback>,
    progress_bar: Option<ProgressBar>,
}

impl Emitter {
    fn emit(&self, event: ScanEvent) {
        let Some(ref callback) = self.callback else {
            return;
        };
        match self.progress_bar {
            Some(ref pb) => pb.suspend(|| callback(event)),
            None => callback(event),
        }
    }

    fn status(&self, msg: String) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(msg);
        }
    }
}

/// Execute a scan with the given options.
///
/// Only an invalid target or an unusable HTTP client fail the scan; every
/// per-request failure is absorbed along the way. Setting `cancel` stops the
/// crawl at its next dequeue and skips pages not yet probed.
pub async fn execute_scan(
    options: ScanOptions,
    event_callback: Option<ScanEventCallback>,
    cancel: Arc<AtomicBool>,
) -> Result<ScanReport> {
    let ScanOptions {
        target,
        exclusions,
        max_depth,
        workers,
        timeout_secs,
        payload,
        show_progress_bars,
    } = options;

    let started_at = Utc::now();
    let scope = Scope::new(&target, &exclusions)?;
    let client = build_client(timeout_secs)?;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let emitter = Emitter {
        callback: event_callback,
        progress_bar: progress_bar.clone(),
    };

    // Phase 1: crawl
    let discovered = Arc::new(AtomicUsize::new(0));
    let crawl_emitter = emitter.clone();
    let discovered_clone = discovered.clone();
    let crawler = Crawler::new(client.clone(), scope)
        .with_max_depth(max_depth)
        .with_workers(workers)
        .with_cancel_flag(cancel.clone())
        .with_progress_callback(Arc::new(move |depth: usize, url: String| {
            let count = discovered_clone.fetch_add(1, Ordering::Relaxed) + 1;
            crawl_emitter.status(format!("Crawling... {} URLs discovered", count));
            crawl_emitter.emit(ScanEvent::Discovered { url, depth });
        }));

    let target = crawler.scope().base().to_string();
    let pages = crawler.crawl().await;
    emitter.emit(ScanEvent::CrawlFinished { pages: pages.len() });

    // Phase 2: probe
    let prober = Prober::with_payload(client, &payload);
    let total = pages.len();
    let probed = AtomicUsize::new(0);

    let per_page: Vec<Vec<ProbeResult>> = stream::iter(pages.iter().map(|p| p.url.clone()))
        .map(|url| {
            let prober = &prober;
            let emitter = &emitter;
            let cancel = &cancel;
            let probed = &probed;
            async move {
                if cancel.load(Ordering::Relaxed) {
                    return Vec::new();
                }
                let count = probed.fetch_add(1, Ordering::Relaxed) + 1;
                emitter.status(format!("Probing page {}/{}", count, total));
                scan_page(prober, emitter, url).await
            }
        })
        .buffered(workers.max(1))
        .collect()
        .await;

    let cancelled = cancel.load(Ordering::Relaxed);
    if cancelled {
        emitter.emit(ScanEvent::Cancelled);
    }

    let results: Vec<ProbeResult> = per_page.into_iter().flatten().collect();

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    let report = ScanReport {
        target,
        started_at,
        finished_at: Utc::now(),
        max_depth,
        pages,
        results,
        cancelled,
    };
    info!(
        "Scan complete: {} pages, {} surfaces tested, {} findings",
        report.pages.len(),
        report.tested().count(),
        report.findings().count()
    );

    Ok(report)
}

/// Probes every form on `url`, then `url` itself if it carries a query.
async fn scan_page(prober: &Prober, emitter: &Emitter, url: String) -> Vec<ProbeResult> {
    let mut results = Vec::new();

    for form in prober.discover_forms(&url).await {
        emitter.emit(ScanEvent::TestingForm {
            page: url.clone(),
            action: form.action.clone(),
        });
        let result = prober.probe_form(&url, form).await;
        if result.payload_reflected {
            emitter.emit(ScanEvent::Vulnerable(result.clone()));
        }
        results.push(result);
    }

    if url.contains('?') {
        emitter.emit(ScanEvent::TestingUrl { url: url.clone() });
    }
    let result = prober.probe_url(&url).await;
    if result.payload_reflected {
        emitter.emit(ScanEvent::Vulnerable(result.clone()));
    }
    results.push(result);

    results
}
