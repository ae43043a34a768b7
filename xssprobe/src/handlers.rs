use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;
use xssprobe_core::report::ReportFormat;
use xssprobe_core::scan::{ScanEvent, ScanOptions, ScanReport, execute_scan};
use xssprobe_scanner::crawler::{DEFAULT_MAX_DEPTH, DEFAULT_WORKERS};
use xssprobe_scanner::http::DEFAULT_TIMEOUT_SECS;
use xssprobe_scanner::normalize;

/// Parse the scan target, adding http:// if the scheme is missing
pub fn parse_target(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if let Ok(url) = Url::parse(raw)
        && matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some()
    {
        return Ok(raw.to_string());
    }

    let with_scheme = format!("http://{}", raw);
    match Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some() && !raw.contains("://") => Ok(with_scheme),
        _ => Err(format!("'{}' is not a valid http(s) URL", raw)),
    }
}

/// Load the ignore list: one URL per line, blank lines skipped, each entry
/// normalized.
pub fn load_ignore_list(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(normalize)
        .collect())
}

/// Like [`load_ignore_list`], but a missing or unreadable file only warns.
pub fn load_exclusions(raw_path: &str) -> Vec<String> {
    let expanded = shellexpand::tilde(raw_path);
    let path = Path::new(expanded.as_ref());

    match load_ignore_list(path) {
        Ok(urls) => {
            debug!("Loaded {} exclusions from {}", urls.len(), path.display());
            urls
        }
        Err(e) => {
            eprintln!(
                "{} Could not read ignore file {}: {}. Continuing with no exclusions.",
                "⚠".yellow().bold(),
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

/// Console line for a scan event. In quiet mode only findings are shown.
pub fn format_event(event: &ScanEvent, quiet: bool) -> Option<String> {
    match event {
        ScanEvent::Vulnerable(result) => Some(format!(
            "\n{} XSS found in {}\n",
            "[!!!]".red().bold(),
            result.surface
        )),
        _ if quiet => None,
        ScanEvent::Discovered { url, .. } => {
            Some(format!("{} Discovered URL: {}", "[+]".green().bold(), url))
        }
        ScanEvent::CrawlFinished { pages } => Some(format!(
            "\n{} Crawl complete, {} pages discovered. Testing surfaces...\n",
            "✓".green().bold(),
            pages
        )),
        ScanEvent::TestingForm { page, action } => Some(format!(
            "{} Testing form on {} -> {}",
            "[+]".cyan().bold(),
            page,
            action
        )),
        ScanEvent::TestingUrl { url } => {
            Some(format!("{} Testing URL: {}", "[+]".cyan().bold(), url))
        }
        ScanEvent::Cancelled => Some(format!(
            "{} Scan interrupted, remaining pages skipped",
            "ℹ".blue().bold()
        )),
    }
}

pub async fn handle_scan(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run_scan(sub_matches).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_scan(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let quiet = sub_matches.get_flag("quiet");
    let target = sub_matches
        .get_one::<String>("TARGET_URL")
        .context("a target URL is required")?;
    let ignore_file = sub_matches
        .get_one::<String>("IGNORE_FILE")
        .context("an ignore file is required")?;
    let max_depth = *sub_matches
        .get_one::<usize>("depth")
        .unwrap_or(&DEFAULT_MAX_DEPTH);
    let threads = *sub_matches
        .get_one::<usize>("threads")
        .unwrap_or(&DEFAULT_WORKERS);
    let timeout = *sub_matches
        .get_one::<u64>("timeout")
        .unwrap_or(&DEFAULT_TIMEOUT_SECS);
    let output = sub_matches.get_one::<PathBuf>("output");
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_name(f))
        .unwrap_or(ReportFormat::Text);

    let exclusions = load_exclusions(ignore_file);

    if !quiet {
        println!("\n🕷️  Scanning {}", target);
        println!("Workers: {}", threads);
        println!("Max depth: {}", max_depth);
        println!("Ignored URLs: {}\n", exclusions.len());
    }

    let mut options = ScanOptions::new(target.as_str());
    options.exclusions = exclusions;
    options.max_depth = max_depth;
    options.workers = threads;
    options.timeout_secs = timeout;
    options.show_progress_bars = !quiet;

    let event_callback = Arc::new(move |event: ScanEvent| {
        if let Some(line) = format_event(&event, quiet) {
            println!("{}", line);
        }
    });

    let cancel = Arc::new(AtomicBool::new(false));
    let scan = execute_scan(options, Some(event_callback), cancel.clone());
    tokio::pin!(scan);

    // First Ctrl-C lets in-flight requests finish and keeps partial results,
    // a second one quits immediately.
    let report: ScanReport = tokio::select! {
        result = &mut scan => result?,
        _ = tokio::signal::ctrl_c() => {
            cancel.store(true, Ordering::Relaxed);
            eprintln!(
                "\n{} Interrupted, finishing in-flight requests (Ctrl-C again to quit)",
                "ℹ".blue().bold()
            );
            tokio::select! {
                result = &mut scan => result?,
                _ = tokio::signal::ctrl_c() => {
                    eprintln!("{} Scan aborted by user.", "ℹ".blue().bold());
                    return Ok(());
                }
            }
        }
    };

    if let Some(path) = output {
        colored::control::set_override(false);
        let rendered = format.render(&report)?;
        fs::write(path, rendered)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("\n{} Report saved to {}", "✓".green().bold(), path.display());
    } else {
        println!("\n{}", format.render(&report)?);
    }

    Ok(())
}
