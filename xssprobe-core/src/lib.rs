pub mod report;
pub mod scan;

pub use report::{ReportFormat, extract_url_path, generate_json_report, generate_text_report};
pub use scan::{ScanEvent, ScanEventCallback, ScanOptions, ScanReport, execute_scan};
