use crate::scan::ScanReport;
use colored::Colorize;
use std::collections::BTreeMap;
use url::Url;
use xssprobe_scanner::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn render(self, report: &ScanReport) -> Result<String, serde_json::Error> {
        match self {
            ReportFormat::Text => Ok(generate_text_report(report)),
            ReportFormat::Json => generate_json_report(report),
        }
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Generate a human-readable scan report
pub fn generate_text_report(report: &ScanReport) -> String {
    let findings: Vec<_> = report.findings().collect();

    let mut out = String::new();
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!("  Target: {}\n", report.target));
    out.push_str(&format!("  Max depth: {}\n", report.max_depth));
    out.push_str(&format!("  Pages crawled: {}\n", report.pages.len()));
    out.push_str(&format!("  Surfaces tested: {}\n", report.tested().count()));
    out.push_str(&format!("  Findings: {}\n", findings.len()));
    out.push_str(&format!(
        "  Duration: {}s\n",
        (report.finished_at - report.started_at).num_seconds()
    ));
    if report.cancelled {
        out.push_str(&format!("  {}\n", "Scan interrupted, results are partial".yellow()));
    }

    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if findings.is_empty() {
        out.push_str("No reflected XSS found.\n");
        return out;
    }

    // Group findings by host of the page they were found on
    let mut by_host: BTreeMap<String, Vec<&Surface>> = BTreeMap::new();
    for finding in &findings {
        let page = match &finding.surface {
            Surface::Url { url } => url,
            Surface::Form { page, .. } => page,
        };
        by_host.entry(host_of(page)).or_default().push(&finding.surface);
    }

    for (host, surfaces) in by_host.iter() {
        out.push_str(&format!("## {}\n", host));
        out.push_str(&format!("  {} finding(s)\n\n", surfaces.len()));

        for surface in surfaces {
            match surface {
                Surface::Url { url } => {
                    out.push_str(&format!("  {} URL {}\n", "[XSS]".red().bold(), url));
                }
                Surface::Form { page, form } => {
                    out.push_str(&format!(
                        "  {} {} form on {} -> {}\n",
                        "[XSS]".red().bold(),
                        form.method,
                        extract_url_path(page),
                        form.action
                    ));
                    let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
                    out.push_str(&format!("      fields: {}\n", names.join(", ")));
                }
            }
        }
        out.push('\n');
    }

    out
}

pub fn generate_json_report(report: &ScanReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
