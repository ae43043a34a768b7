use crate::handlers::parse_target;
use clap::{arg, command};
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("xssprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("xssprobe")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Only print findings and the final report")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("scan")
                .about(
                    "Crawl a target within its origin, then probe every discovered form and \
                query string for reflected XSS.",
                )
                .arg(
                    arg!(<TARGET_URL>)
                        .help("Base URL to scan; only URLs starting with it are visited")
                        .value_parser(parse_target),
                )
                .arg(
                    arg!(<IGNORE_FILE>)
                        .help("Newline-delimited list of URLs never to visit (e.g. logout pages)"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum number of links followed from the target")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of concurrent requests in flight.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
