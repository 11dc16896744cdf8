//! Evidence-link policy.
//!
//! Each candidate is length-checked, scanned as raw text, parsed, and then
//! judged by the configured domain policy. Accepted links are de-duplicated
//! by their normalized form and capped at `max_urls`.

mod host;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use url::Url;

use crate::config::{DomainPolicy, UrlConfig, MAX_URLS_CAP};
use crate::error::GuardError;

use host::{describe_host, is_local_or_ip, matches_any};

/// Raw-text markers that always reject a link.
const REJECT_MARKERS: [(&str, &str); 6] = [
    ("javascript:", "javascript: scheme"),
    ("vbscript:", "vbscript: scheme"),
    ("data:", "data: scheme"),
    ("<script", "embedded script tag"),
    ("\0", "null byte"),
    ("%00", "encoded null byte"),
];

/// Raw-text markers that only flag a link.
const SUSPICIOUS_MARKERS: [(&str, &str); 4] = [
    ("..", "path traversal"),
    ("%2e%2e", "encoded path traversal"),
    ("eval(", "eval call"),
    ("exec(", "exec call"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    Valid,
    Invalid,
    Suspicious,
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrlStatus::Valid => "valid",
            UrlStatus::Invalid => "invalid",
            UrlStatus::Suspicious => "suspicious",
        };
        f.write_str(s)
    }
}

/// Classification of one candidate link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlVerdict {
    pub input: String,
    /// Parsed, normalized form; `None` when parsing never happened or failed.
    pub normalized: Option<String>,
    pub status: UrlStatus,
    pub reason: String,
    /// Survived de-duplication and the cap. Always false for invalid links.
    pub kept: bool,
}

impl UrlVerdict {
    fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            normalized: None,
            status: UrlStatus::Invalid,
            reason: reason.into(),
            kept: false,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.kept
    }

    fn drop_with(&mut self, reason: String) {
        self.kept = false;
        self.reason = reason;
    }
}

/// Outcome of validating a batch of links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrlBatch {
    /// Clean links kept, normalized.
    pub valid: Vec<String>,
    /// Inputs that were dropped.
    pub invalid: Vec<String>,
    /// Flagged links kept, normalized.
    pub suspicious: Vec<String>,
    pub warnings: Vec<String>,
    /// Kept links (valid and suspicious) in input order.
    pub accepted: Vec<String>,
    pub verdicts: Vec<UrlVerdict>,
}

impl UrlBatch {
    /// One `UrlRejected` per dropped link.
    pub fn rejections(&self) -> Vec<GuardError> {
        self.verdicts
            .iter()
            .filter(|v| v.status == UrlStatus::Invalid)
            .map(|v| GuardError::UrlRejected {
                url: v.input.clone(),
                reason: v.reason.clone(),
            })
            .collect()
    }
}

pub struct UrlValidator {
    config: UrlConfig,
}

impl UrlValidator {
    pub fn new(mut config: UrlConfig) -> Self {
        for list in [
            &mut config.blocked_domains,
            &mut config.allowed_domains,
            &mut config.shortener_domains,
        ] {
            for d in list.iter_mut() {
                *d = d.trim().trim_end_matches('.').to_ascii_lowercase();
            }
        }
        config.max_urls = config.max_urls.clamp(1, MAX_URLS_CAP);
        Self { config }
    }

    pub fn policy(&self) -> DomainPolicy {
        self.config.domain_policy
    }

    /// Classify a single candidate.
    pub fn classify(&self, raw: &str) -> UrlVerdict {
        let input = raw.trim();
        if input.is_empty() {
            return UrlVerdict::invalid(raw, "empty");
        }

        let length = input.chars().count();
        if length > self.config.max_length {
            return UrlVerdict::invalid(
                input,
                format!("longer than {} characters", self.config.max_length),
            );
        }

        let lower = input.to_ascii_lowercase();
        if let Some((_, what)) = REJECT_MARKERS.iter().find(|(m, _)| lower.contains(m)) {
            return UrlVerdict::invalid(input, format!("contains {what}"));
        }

        let parsed = match Url::parse(input) {
            Ok(u) => u,
            Err(e) => return UrlVerdict::invalid(input, format!("not a valid URL: {e}")),
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return UrlVerdict::invalid(
                input,
                format!("unsupported protocol {}", parsed.scheme()),
            );
        }
        let Some(host) = parsed.host() else {
            return UrlVerdict::invalid(input, "missing host");
        };
        let host_name = host.to_string().to_ascii_lowercase();
        let host_name = host_name.trim_end_matches('.');

        let mut notes: Vec<String> = Vec::new();
        match self.config.domain_policy {
            DomainPolicy::Allowlist => {
                if !matches_any(host_name, &self.config.allowed_domains) {
                    return UrlVerdict::invalid(input, format!("{host_name} is not on the allowlist"));
                }
            }
            DomainPolicy::Denylist => {
                if matches_any(host_name, &self.config.blocked_domains) {
                    return UrlVerdict::invalid(input, format!("{host_name} is blocked"));
                }
                if is_local_or_ip(&host) {
                    notes.push(format!("points at a {}", describe_host(&host)));
                }
                if matches_any(host_name, &self.config.shortener_domains) {
                    notes.push("URL shortener hides the destination".to_string());
                }
            }
        }

        for (marker, what) in SUSPICIOUS_MARKERS {
            if lower.contains(marker) {
                notes.push(format!("contains {what}"));
            }
        }

        let (status, reason) = if notes.is_empty() {
            (UrlStatus::Valid, "ok".to_string())
        } else {
            (UrlStatus::Suspicious, notes.join("; "))
        };
        UrlVerdict {
            input: input.to_string(),
            normalized: Some(parsed.to_string()),
            status,
            reason,
            kept: true,
        }
    }

    /// Validate a batch: blank entries are skipped, duplicates collapse onto
    /// the first occurrence, and at most `max_urls` links are kept.
    pub fn validate<S: AsRef<str>>(&self, urls: &[S]) -> UrlBatch {
        let mut batch = UrlBatch::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut over_cap = 0usize;

        for raw in urls.iter().map(AsRef::as_ref) {
            if raw.trim().is_empty() {
                continue;
            }
            let mut verdict = self.classify(raw);
            match (verdict.status, verdict.normalized.clone()) {
                (UrlStatus::Invalid, _) | (_, None) => {
                    tracing::debug!(url = %verdict.input, reason = %verdict.reason, "dropping link");
                    batch.invalid.push(verdict.input.clone());
                }
                (status, Some(normalized)) => {
                    if !seen.insert(normalized.clone()) {
                        tracing::debug!(url = %normalized, "duplicate link collapsed");
                        verdict.drop_with("duplicate of an earlier link".to_string());
                    } else if batch.accepted.len() >= self.config.max_urls {
                        over_cap += 1;
                        verdict.drop_with(format!(
                            "over cap (only {} links kept)",
                            self.config.max_urls
                        ));
                    } else {
                        if status == UrlStatus::Suspicious {
                            batch
                                .warnings
                                .push(format!("{normalized}: {}", verdict.reason));
                            batch.suspicious.push(normalized.clone());
                        } else {
                            batch.valid.push(normalized.clone());
                        }
                        batch.accepted.push(normalized);
                    }
                }
            }
            batch.verdicts.push(verdict);
        }

        if over_cap > 0 {
            batch.warnings.push(format!(
                "only the first {} links are kept; {over_cap} more dropped",
                self.config.max_urls
            ));
        }
        batch
    }
}

#[cfg(test)]
mod tests;
