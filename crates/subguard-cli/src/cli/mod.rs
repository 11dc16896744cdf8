//! Diagnostic CLI for the submission guard.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use subguard_core::config::{self, DomainPolicy, SanitizeMode};
use subguard_core::content::ContentThreatScanner;
use subguard_core::store::{JsonFileStore, KeyValueStore, MemoryStore};
use subguard_core::url_policy::UrlValidator;
use subguard_core::SecurityPipeline;

use commands::{run_check_urls, run_rate_limit, run_sanitize, run_scan, run_token, run_validate};

/// Top-level CLI for the submission guard.
#[derive(Debug, Parser)]
#[command(name = "subguard")]
#[command(about = "subguard: submission security checks for anonymous posts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Sanitization mode as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    StripMarkup,
    EscapeOnly,
}

impl From<ModeArg> for SanitizeMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::StripMarkup => SanitizeMode::StripMarkup,
            ModeArg::EscapeOnly => SanitizeMode::EscapeOnly,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a submission through the full pipeline.
    Validate {
        /// Submission text.
        content: String,
        /// Evidence link (repeatable).
        #[arg(long = "url", value_name = "URL")]
        urls: Vec<String>,
        /// Rate-limit action key.
        #[arg(long, default_value = "submission")]
        action: String,
    },

    /// Print the threat report for a piece of text.
    Scan {
        text: String,
    },

    /// Sanitize text.
    Sanitize {
        text: String,
        /// Override the configured mode.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Classify evidence links.
    CheckUrls {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Judge against the allowlist instead of the denylist.
        #[arg(long)]
        allowlist: bool,
    },

    /// Show (creating if needed), validate, or clear the anonymous token.
    Token {
        /// Check a token string instead of reading the stored one.
        #[arg(long, value_name = "TOKEN", conflicts_with = "clear")]
        validate: Option<String>,
        /// Remove the stored token.
        #[arg(long)]
        clear: bool,
    },

    /// Inspect or reset the rate-limit window for an action.
    RateLimit {
        action: String,
        /// Forget the counter for this action.
        #[arg(long, conflicts_with = "cleanup")]
        reset: bool,
        /// Also drop every stale window in the store.
        #[arg(long)]
        cleanup: bool,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Scan { text } => {
                run_scan(&ContentThreatScanner::new(cfg.content), &text)
            }
            CliCommand::Sanitize { text, mode } => {
                let mut content = cfg.content;
                if let Some(mode) = mode {
                    content.sanitize_mode = mode.into();
                }
                run_sanitize(&ContentThreatScanner::new(content), &text)
            }
            CliCommand::CheckUrls { urls, allowlist } => {
                let mut policy = cfg.urls;
                if allowlist {
                    policy.domain_policy = DomainPolicy::Allowlist;
                }
                run_check_urls(&UrlValidator::new(policy), &urls)
            }
            CliCommand::Validate {
                content,
                urls,
                action,
            } => {
                let store = open_store(JsonFileStore::default_path());
                let mut pipeline = SecurityPipeline::new(cfg, store);
                run_validate(&mut pipeline, &content, &urls, &action)
            }
            CliCommand::Token { validate, clear } => {
                let store = open_store(JsonFileStore::default_path());
                let mut pipeline = SecurityPipeline::new(cfg, store);
                run_token(&mut pipeline, validate.as_deref(), clear)
            }
            CliCommand::RateLimit {
                action,
                reset,
                cleanup,
            } => {
                let store = open_store(JsonFileStore::default_path());
                let mut pipeline = SecurityPipeline::new(cfg, store);
                run_rate_limit(&mut pipeline, &action, reset, cleanup)
            }
        }
    }
}

/// State store for the commands that need one. A corrupt state file starts
/// empty; no usable state dir at all falls back to memory for this run.
pub(crate) fn open_store(path: Result<PathBuf>) -> Box<dyn KeyValueStore> {
    match path {
        Ok(path) => Box::new(JsonFileStore::open_or_empty(path)),
        Err(err) => {
            tracing::warn!("state dir unavailable, using in-memory store: {err:#}");
            Box::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests;
