//! Tests for validate, scan, sanitize.

use clap::Parser;

use super::parse;
use crate::cli::{Cli, CliCommand, ModeArg};

#[test]
fn cli_parse_validate_defaults() {
    match parse(&["subguard", "validate", "some juicy gossip"]) {
        CliCommand::Validate {
            content,
            urls,
            action,
        } => {
            assert_eq!(content, "some juicy gossip");
            assert!(urls.is_empty());
            assert_eq!(action, "submission");
        }
        _ => panic!("expected Validate"),
    }
}

#[test]
fn cli_parse_validate_with_urls_and_action() {
    match parse(&[
        "subguard",
        "validate",
        "text",
        "--url",
        "https://github.com/a",
        "--url",
        "https://x.com/b",
        "--action",
        "reaction",
    ]) {
        CliCommand::Validate { urls, action, .. } => {
            assert_eq!(urls, vec!["https://github.com/a", "https://x.com/b"]);
            assert_eq!(action, "reaction");
        }
        _ => panic!("expected Validate"),
    }
}

#[test]
fn cli_parse_scan() {
    match parse(&["subguard", "scan", "<script>x</script>"]) {
        CliCommand::Scan { text } => assert_eq!(text, "<script>x</script>"),
        _ => panic!("expected Scan"),
    }
}

#[test]
fn cli_parse_sanitize() {
    match parse(&["subguard", "sanitize", "<b>hi</b>"]) {
        CliCommand::Sanitize { text, mode } => {
            assert_eq!(text, "<b>hi</b>");
            assert!(mode.is_none());
        }
        _ => panic!("expected Sanitize"),
    }
}

#[test]
fn cli_parse_sanitize_escape_only() {
    match parse(&["subguard", "sanitize", "x", "--mode", "escape-only"]) {
        CliCommand::Sanitize { mode, .. } => assert_eq!(mode, Some(ModeArg::EscapeOnly)),
        _ => panic!("expected Sanitize with mode"),
    }
}

#[test]
fn cli_parse_sanitize_rejects_unknown_mode() {
    assert!(Cli::try_parse_from(["subguard", "sanitize", "x", "--mode", "loose"]).is_err());
}
