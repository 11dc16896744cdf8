use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard upper bound on `urls.max_urls`.
pub const MAX_URLS_CAP: usize = 5;

/// How submitted text is cleaned before it is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeMode {
    /// Drop every tag and stray angle bracket.
    #[default]
    StripMarkup,
    /// Keep the text, entity-escape `< > " ' / \` =`.
    EscapeOnly,
}

/// Which domain list decides link acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPolicy {
    /// Reject listed domains, flag loopback/IP/shorteners, accept the rest.
    #[default]
    Denylist,
    /// Accept only listed domains.
    Allowlist,
}

/// Attempts allowed per fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRule {
    pub max_attempts: u32,
    pub window_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Default attempts per window for actions without an override.
    pub max_attempts: u32,
    /// Default window length in minutes.
    pub window_minutes: u64,
    /// Per-action overrides keyed by action name.
    pub actions: BTreeMap<String, RateRule>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut actions = BTreeMap::new();
        actions.insert(
            "reaction".to_string(),
            RateRule {
                max_attempts: 30,
                window_minutes: 1,
            },
        );
        Self {
            max_attempts: 3,
            window_minutes: 60,
            actions,
        }
    }
}

impl RateLimitConfig {
    /// Rule for an action: its override, or the defaults.
    pub fn rule_for(&self, action: &str) -> RateRule {
        self.actions.get(action).copied().unwrap_or(RateRule {
            max_attempts: self.max_attempts,
            window_minutes: self.window_minutes,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime of a persisted anonymous token.
    pub ttl_hours: u64,
    /// Push the expiry forward by one TTL on every successful read.
    pub sliding_expiry: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            sliding_expiry: true,
        }
    }
}

impl TokenConfig {
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_hours.saturating_mul(3_600_000)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Shorter content (in chars, trimmed) is a hard fail.
    pub min_length: usize,
    /// Longer content is flagged but not blocked on its own.
    pub max_length: usize,
    pub sanitize_mode: SanitizeMode,
    /// Treat a SQL-injection finding as blocking.
    pub block_sql_injection: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 2000,
            sanitize_mode: SanitizeMode::default(),
            block_sql_injection: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    pub domain_policy: DomainPolicy,
    /// Accepted links kept per submission.
    pub max_urls: usize,
    /// Longest accepted URL in characters.
    pub max_length: usize,
    pub blocked_domains: Vec<String>,
    pub allowed_domains: Vec<String>,
    pub shortener_domains: Vec<String>,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            domain_policy: DomainPolicy::default(),
            max_urls: 3,
            max_length: 2048,
            blocked_domains: to_strings(&[
                "grabify.link",
                "iplogger.org",
                "iplogger.com",
                "2no.co",
                "yip.su",
                "blasze.tk",
            ]),
            allowed_domains: to_strings(&[
                "twitter.com",
                "x.com",
                "reddit.com",
                "github.com",
                "gitlab.com",
                "medium.com",
                "substack.com",
                "mirror.xyz",
                "youtube.com",
                "youtu.be",
                "t.me",
                "discord.com",
                "linkedin.com",
                "etherscan.io",
                "bscscan.com",
                "solscan.io",
                "dune.com",
                "coindesk.com",
                "cointelegraph.com",
                "theblock.co",
                "decrypt.co",
                "bloomberg.com",
                "reuters.com",
                "techcrunch.com",
                "news.ycombinator.com",
                "stackoverflow.com",
            ]),
            shortener_domains: to_strings(&[
                "bit.ly",
                "tinyurl.com",
                "t.co",
                "goo.gl",
                "ow.ly",
                "is.gd",
                "buff.ly",
                "rebrand.ly",
                "cutt.ly",
                "shorturl.at",
            ]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Global configuration loaded from `~/.config/subguard/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubguardConfig {
    pub rate_limit: RateLimitConfig,
    pub token: TokenConfig,
    pub content: ContentConfig,
    pub urls: UrlConfig,
}

/// A semantic problem with an otherwise well-formed config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{0} must be greater than zero")]
    Zero(String),
    #[error("content.min_length ({min}) exceeds content.max_length ({max})")]
    LengthBounds { min: usize, max: usize },
    #[error("urls.max_urls must be between 1 and {MAX_URLS_CAP}, got {0}")]
    MaxUrls(usize),
    #[error("urls.domain_policy is allowlist but urls.allowed_domains is empty")]
    EmptyAllowlist,
}

impl SubguardConfig {
    /// Check value ranges. Reports every issue, not just the first.
    pub fn validate(&self) -> Result<(), Vec<ConfigIssue>> {
        let mut issues = Vec::new();

        let mut check_rule = |name: &str, rule: RateRule| {
            if rule.max_attempts == 0 {
                issues.push(ConfigIssue::Zero(format!("{name}.max_attempts")));
            }
            if rule.window_minutes == 0 {
                issues.push(ConfigIssue::Zero(format!("{name}.window_minutes")));
            }
        };
        check_rule(
            "rate_limit",
            RateRule {
                max_attempts: self.rate_limit.max_attempts,
                window_minutes: self.rate_limit.window_minutes,
            },
        );
        for (action, rule) in &self.rate_limit.actions {
            check_rule(&format!("rate_limit.actions.{action}"), *rule);
        }

        if self.token.ttl_hours == 0 {
            issues.push(ConfigIssue::Zero("token.ttl_hours".to_string()));
        }
        if self.content.min_length > self.content.max_length {
            issues.push(ConfigIssue::LengthBounds {
                min: self.content.min_length,
                max: self.content.max_length,
            });
        }
        if self.urls.max_urls == 0 || self.urls.max_urls > MAX_URLS_CAP {
            issues.push(ConfigIssue::MaxUrls(self.urls.max_urls));
        }
        if self.urls.max_length == 0 {
            issues.push(ConfigIssue::Zero("urls.max_length".to_string()));
        }
        if self.urls.domain_policy == DomainPolicy::Allowlist && self.urls.allowed_domains.is_empty()
        {
            issues.push(ConfigIssue::EmptyAllowlist);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

fn issues_to_error(issues: Vec<ConfigIssue>) -> anyhow::Error {
    let joined = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    anyhow::anyhow!("invalid config: {joined}")
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("subguard")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load and validate configuration from a specific file.
pub fn load_from_path(path: &Path) -> Result<SubguardConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SubguardConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate().map_err(issues_to_error)?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SubguardConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SubguardConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}
