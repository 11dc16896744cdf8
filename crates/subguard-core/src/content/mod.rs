//! Content threat scanning and sanitization.
//!
//! A scan runs four independent signature families in a fixed order (XSS,
//! SQL, command injection, path traversal) plus the length policy. The
//! report's risk level is the highest severity found, never a sum.

mod patterns;
mod sanitize;

use std::fmt;

use serde::Serialize;

use crate::config::ContentConfig;

pub use sanitize::{escape_markup, sanitize, strip_markup};

/// Severity of a finding, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    Xss,
    SqlInjection,
    CommandInjection,
    PathTraversal,
    TooShort,
    TooLong,
}

impl ThreatKind {
    pub fn severity(self) -> RiskLevel {
        match self {
            ThreatKind::Xss => RiskLevel::Critical,
            ThreatKind::SqlInjection => RiskLevel::High,
            ThreatKind::CommandInjection | ThreatKind::PathTraversal => RiskLevel::Medium,
            ThreatKind::TooShort | ThreatKind::TooLong => RiskLevel::Low,
        }
    }
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreatKind::Xss => "xss",
            ThreatKind::SqlInjection => "sql injection",
            ThreatKind::CommandInjection => "command injection",
            ThreatKind::PathTraversal => "path traversal",
            ThreatKind::TooShort => "too short",
            ThreatKind::TooLong => "too long",
        };
        f.write_str(s)
    }
}

/// A single matched signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: ThreatKind,
    pub signature: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreatReport {
    pub sanitized_content: String,
    /// Distinct kinds, in scan order.
    pub threats_found: Vec<ThreatKind>,
    pub risk_level: RiskLevel,
    pub findings: Vec<Finding>,
}

impl ThreatReport {
    /// No threats, or the only one is excess length.
    pub fn is_valid(&self) -> bool {
        self.threats_found
            .iter()
            .all(|t| *t == ThreatKind::TooLong)
    }

    pub fn has(&self, kind: ThreatKind) -> bool {
        self.threats_found.contains(&kind)
    }
}

pub struct ContentThreatScanner {
    config: ContentConfig,
}

impl ContentThreatScanner {
    pub fn new(config: ContentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Sanitize with the configured mode.
    pub fn sanitize(&self, text: &str) -> String {
        sanitize(text, self.config.sanitize_mode)
    }

    pub fn scan(&self, text: &str) -> ThreatReport {
        let families = [
            (ThreatKind::Xss, &*patterns::XSS),
            (ThreatKind::SqlInjection, &*patterns::SQL),
            (ThreatKind::CommandInjection, &*patterns::COMMAND),
            (ThreatKind::PathTraversal, &*patterns::PATH_TRAVERSAL),
        ];

        let mut findings = Vec::new();
        for (kind, family) in families {
            for signature in patterns::matching(family, text) {
                findings.push(Finding { kind, signature });
            }
        }

        let length = text.trim().chars().count();
        if length < self.config.min_length {
            findings.push(Finding {
                kind: ThreatKind::TooShort,
                signature: "min_length",
            });
        } else if length > self.config.max_length {
            findings.push(Finding {
                kind: ThreatKind::TooLong,
                signature: "max_length",
            });
        }

        let mut threats_found: Vec<ThreatKind> = Vec::new();
        for f in &findings {
            if !threats_found.contains(&f.kind) {
                threats_found.push(f.kind);
            }
        }
        let risk_level = threats_found
            .iter()
            .map(|t| t.severity())
            .max()
            .unwrap_or_default();

        if !threats_found.is_empty() {
            tracing::debug!(
                risk = %risk_level,
                threats = ?threats_found,
                "content scan found threats"
            );
        }

        ThreatReport {
            sanitized_content: self.sanitize(text),
            threats_found,
            risk_level,
            findings,
        }
    }

    /// Why this report stops a submission, if it does: too short, critical,
    /// high with a blocking family, or too long alongside any other threat.
    pub fn blocking_reason(&self, report: &ThreatReport) -> Option<String> {
        if report.has(ThreatKind::TooShort) {
            return Some(format!(
                "content too short (minimum {} characters)",
                self.config.min_length
            ));
        }
        match report.risk_level {
            RiskLevel::Critical => Some(format!(
                "content contains a critical threat: {}",
                describe(report, RiskLevel::Critical)
            )),
            RiskLevel::High
                if self.config.block_sql_injection && report.has(ThreatKind::SqlInjection) =>
            {
                Some(format!(
                    "content contains a high-risk threat: {}",
                    describe(report, RiskLevel::High)
                ))
            }
            _ if report.has(ThreatKind::TooLong) && !report.is_valid() => {
                let others = report
                    .threats_found
                    .iter()
                    .filter(|t| **t != ThreatKind::TooLong)
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!(
                    "content longer than {} characters and flagged for {others}",
                    self.config.max_length
                ))
            }
            _ => None,
        }
    }
}

fn describe(report: &ThreatReport, level: RiskLevel) -> String {
    report
        .threats_found
        .iter()
        .filter(|t| t.severity() == level)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
