use std::io::Write;
use tempfile::NamedTempFile;
use xssprobe::command_argument_builder;
use xssprobe::handlers::*;
use xssprobe_core::scan::ScanEvent;
use xssprobe_scanner::crawler::{DEFAULT_MAX_DEPTH, DEFAULT_WORKERS};
use xssprobe_scanner::http::DEFAULT_TIMEOUT_SECS;
use xssprobe_scanner::{ProbeResult, Surface};

#[test]
fn test_parse_target_with_scheme() {
    assert_eq!(
        parse_target("https://example.com"),
        Ok("https://example.com".to_string())
    );
}

#[test]
fn test_parse_target_without_scheme() {
    assert_eq!(
        parse_target("example.com"),
        Ok("http://example.com".to_string())
    );
    assert_eq!(
        parse_target("localhost:8080"),
        Ok("http://localhost:8080".to_string())
    );
}

#[test]
fn test_parse_target_invalid() {
    assert!(parse_target("not a valid url!!!").is_err());
    assert!(parse_target("ftp://example.com").is_err());
}

#[test]
fn test_load_ignore_list() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com/logout/")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "   ")?;
    writeln!(temp_file, "  https://example.com/admin#danger  ")?;

    let urls = load_ignore_list(temp_file.path())?;

    assert_eq!(
        urls,
        vec![
            "https://example.com/logout".to_string(),
            "https://example.com/admin".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_load_exclusions_missing_file_is_not_fatal() {
    let urls = load_exclusions("/definitely/not/here/ignore.txt");
    assert!(urls.is_empty());
}

#[test]
fn test_load_exclusions_reads_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "http://a.test/reset").unwrap();

    let urls = load_exclusions(temp_file.path().to_str().unwrap());
    assert_eq!(urls, vec!["http://a.test/reset".to_string()]);
}

#[test]
fn test_cli_requires_both_arguments() {
    assert!(
        command_argument_builder()
            .try_get_matches_from(["xssprobe", "scan"])
            .is_err()
    );
    assert!(
        command_argument_builder()
            .try_get_matches_from(["xssprobe", "scan", "https://a.test"])
            .is_err()
    );
    assert!(
        command_argument_builder()
            .try_get_matches_from(["xssprobe"])
            .is_err()
    );
}

#[test]
fn test_cli_scan_defaults() {
    let matches = command_argument_builder()
        .try_get_matches_from(["xssprobe", "scan", "a.test", "ignore.txt"])
        .unwrap();
    let (name, scan) = matches.subcommand().unwrap();

    assert_eq!(name, "scan");
    assert_eq!(
        scan.get_one::<String>("TARGET_URL").unwrap(),
        "http://a.test"
    );
    assert_eq!(scan.get_one::<String>("IGNORE_FILE").unwrap(), "ignore.txt");
    assert_eq!(*scan.get_one::<usize>("depth").unwrap(), DEFAULT_MAX_DEPTH);
    assert_eq!(*scan.get_one::<usize>("threads").unwrap(), DEFAULT_WORKERS);
    assert_eq!(*scan.get_one::<u64>("timeout").unwrap(), DEFAULT_TIMEOUT_SECS);
    assert_eq!(scan.get_one::<String>("format").unwrap(), "text");
    assert!(!scan.get_flag("quiet"));
}

#[test]
fn test_cli_rejects_invalid_target() {
    assert!(
        command_argument_builder()
            .try_get_matches_from(["xssprobe", "scan", "ftp://a.test", "ignore.txt"])
            .is_err()
    );
}

#[test]
fn test_format_event_quiet_keeps_findings() {
    let discovered = ScanEvent::Discovered {
        url: "https://a.test/x".to_string(),
        depth: 1,
    };
    let finding = ScanEvent::Vulnerable(ProbeResult {
        surface: Surface::Url {
            url: "https://a.test/s?q=1".to_string(),
        },
        payload_reflected: true,
        request: None,
    });

    assert!(format_event(&discovered, true).is_none());
    assert!(
        format_event(&discovered, false)
            .unwrap()
            .contains("Discovered URL: https://a.test/x")
    );
    assert!(
        format_event(&finding, true)
            .unwrap()
            .contains("XSS found in URL https://a.test/s?q=1")
    );
}
