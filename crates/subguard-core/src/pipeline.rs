//! Submission gate: rate limit, content, links, token, in that order.
//!
//! Later stages never run after a rejection, so a rejected submission does
//! not evaluate links or touch the token record.

use std::fmt;

use rand::RngCore;

use crate::clock::{system_clock, SharedClock};
use crate::config::SubguardConfig;
use crate::content::{ContentThreatScanner, RiskLevel, ThreatKind, ThreatReport};
use crate::error::GuardError;
use crate::rate_limit::{RateDecision, RateLimiter};
use crate::store::{KeyValueStore, StoreError};
use crate::token::{AnonymousToken, TokenCheck, TokenManager, TokenOutcome};
use crate::url_policy::{UrlBatch, UrlValidator};

/// Step that produced a rejection. Link and token problems never reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RateLimit,
    Content,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::RateLimit => "rate_limit",
            Stage::Content => "content",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Accepted {
    pub sanitized_content: String,
    pub accepted_urls: Vec<String>,
    pub token: AnonymousToken,
    /// Human-readable advisories, in stage order.
    pub warnings: Vec<String>,
    /// Structured form of the non-blocking errors behind some warnings.
    pub advisories: Vec<GuardError>,
    pub risk_level: RiskLevel,
    pub threats: Vec<ThreatKind>,
}

#[derive(Debug, Clone)]
pub struct Rejected {
    pub stage: Stage,
    pub error: GuardError,
    pub threats: Vec<ThreatKind>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone)]
pub enum SubmissionVerdict {
    Accepted(Accepted),
    Rejected(Rejected),
}

impl SubmissionVerdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, SubmissionVerdict::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&Accepted> {
        match self {
            SubmissionVerdict::Accepted(a) => Some(a),
            SubmissionVerdict::Rejected(_) => None,
        }
    }

    pub fn rejected(&self) -> Option<&Rejected> {
        match self {
            SubmissionVerdict::Rejected(r) => Some(r),
            SubmissionVerdict::Accepted(_) => None,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            SubmissionVerdict::Accepted(a) => a.risk_level,
            SubmissionVerdict::Rejected(r) => r.risk_level,
        }
    }
}

/// Owns the store and one instance of each component.
pub struct SecurityPipeline<S: KeyValueStore> {
    config: SubguardConfig,
    store: S,
    scanner: ContentThreatScanner,
    urls: UrlValidator,
    limiter: RateLimiter,
    tokens: TokenManager,
}

impl<S: KeyValueStore> SecurityPipeline<S> {
    pub fn new(config: SubguardConfig, store: S) -> Self {
        Self::with_clock(config, store, system_clock())
    }

    pub fn with_clock(config: SubguardConfig, store: S, clock: SharedClock) -> Self {
        Self {
            scanner: ContentThreatScanner::new(config.content.clone()),
            urls: UrlValidator::new(config.urls.clone()),
            limiter: RateLimiter::new(clock.clone()),
            tokens: TokenManager::new(config.token.clone(), clock),
            config,
            store,
        }
    }

    /// Replace the random source used for tokens.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.tokens = self.tokens.with_rng(rng);
        self
    }

    pub fn config(&self) -> &SubguardConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Run every stage for one submission.
    pub fn validate<U: AsRef<str>>(
        &mut self,
        content: &str,
        urls: &[U],
        action: &str,
    ) -> SubmissionVerdict {
        let span = tracing::debug_span!("validate", action);
        let _enter = span.enter();

        let mut warnings = Vec::new();
        let mut advisories = Vec::new();

        let rate = self.check_rate_limit(action);
        if !rate.allowed {
            return SubmissionVerdict::Rejected(Rejected {
                stage: Stage::RateLimit,
                error: GuardError::RateLimitExceeded {
                    action: action.to_string(),
                    retry_after_ms: rate.retry_after_ms,
                },
                threats: Vec::new(),
                risk_level: RiskLevel::Low,
            });
        }
        if let Some(advisory) = rate.advisory {
            warnings.push(advisory.to_string());
            advisories.push(advisory);
        }

        let report = self.scanner.scan(content);
        if let Some(reason) = self.scanner.blocking_reason(&report) {
            tracing::info!(risk = %report.risk_level, %reason, "submission rejected");
            return SubmissionVerdict::Rejected(Rejected {
                stage: Stage::Content,
                error: GuardError::Validation(reason),
                threats: report.threats_found,
                risk_level: report.risk_level,
            });
        }
        warnings.extend(content_warnings(&report, self.config.content.max_length));

        let batch = self.urls.validate(urls);
        for rejection in batch.rejections() {
            warnings.push(rejection.to_string());
            advisories.push(rejection);
        }
        warnings.extend(batch.warnings);

        let outcome = self.tokens.get_or_create(&mut self.store);
        for advisory in outcome.advisories {
            warnings.push(advisory.to_string());
            advisories.push(advisory);
        }

        tracing::debug!(
            risk = %report.risk_level,
            urls = batch.accepted.len(),
            warnings = warnings.len(),
            "submission accepted"
        );
        SubmissionVerdict::Accepted(Accepted {
            sanitized_content: report.sanitized_content,
            accepted_urls: batch.accepted,
            token: outcome.token,
            warnings,
            advisories,
            risk_level: report.risk_level,
            threats: report.threats_found,
        })
    }

    pub fn sanitize(&self, text: &str) -> String {
        self.scanner.sanitize(text)
    }

    pub fn scan(&self, text: &str) -> ThreatReport {
        self.scanner.scan(text)
    }

    pub fn validate_urls<U: AsRef<str>>(&self, urls: &[U]) -> UrlBatch {
        self.urls.validate(urls)
    }

    /// Record an attempt for `action` under its configured rule.
    pub fn check_rate_limit(&mut self, action: &str) -> RateDecision {
        let rule = self.config.rate_limit.rule_for(action);
        self.limiter
            .check(&mut self.store, action, rule.max_attempts, rule.window_minutes)
    }

    /// Window state for `action` without recording an attempt.
    pub fn rate_limit_status(&self, action: &str) -> Result<RateDecision, StoreError> {
        let rule = self.config.rate_limit.rule_for(action);
        self.limiter
            .peek(&self.store, action, rule.max_attempts, rule.window_minutes)
    }

    pub fn reset_rate_limit(&mut self, action: &str) -> Result<(), StoreError> {
        self.limiter.reset(&mut self.store, action)
    }

    pub fn cleanup_stale(&mut self) -> Result<usize, StoreError> {
        self.limiter.cleanup_stale(&mut self.store)
    }

    pub fn get_or_create_token(&mut self) -> TokenOutcome {
        self.tokens.get_or_create(&mut self.store)
    }

    pub fn current_token(&self) -> Result<Option<AnonymousToken>, StoreError> {
        self.tokens.current(&self.store)
    }

    pub fn validate_token(&self, token: &str) -> TokenCheck {
        self.tokens.validate(token)
    }

    pub fn clear_token(&mut self) -> Result<(), StoreError> {
        self.tokens.clear(&mut self.store)
    }
}

/// Non-blocking findings worth telling the submitter about.
fn content_warnings(report: &ThreatReport, max_length: usize) -> Vec<String> {
    report
        .threats_found
        .iter()
        .map(|kind| match kind {
            ThreatKind::TooLong => format!("content longer than {max_length} characters"),
            other => format!("content flagged for {other} ({})", other.severity()),
        })
        .collect()
}
