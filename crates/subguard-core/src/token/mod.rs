//! Anonymous identity tokens.
//!
//! A token is 32 bytes from the OS random source, encoded as unpadded
//! URL-safe base64: always [`TOKEN_LEN`] characters of `[A-Za-z0-9_-]`. The
//! persisted record carries creation time and expiry; see [`TokenManager`]
//! for the lifecycle.

mod manager;

use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

pub use manager::{TokenManager, TokenOutcome, TOKEN_KEY};

/// Random bytes drawn per token.
pub const TOKEN_BYTES: usize = 32;

/// Encoded length of a token.
pub const TOKEN_LEN: usize = 43;

/// Marks tokens built without the secure random source.
pub const DEGRADED_PREFIX: &str = "degraded_";

const SUSPICIOUS_MARKERS: [&str; 6] = ["test", "debug", "admin", "root", "system", "demo"];

/// Persisted token record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousToken {
    pub value: String,
    pub created_at_ms: u64,
    #[serde(default)]
    pub expires_at_ms: Option<u64>,
}

impl AnonymousToken {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        matches!(self.expires_at_ms, Some(exp) if now_ms >= exp)
    }

    /// True when the value came from the fallback generator.
    pub fn is_degraded(&self) -> bool {
        self.value.starts_with(DEGRADED_PREFIX)
    }
}

/// Why a token string is syntactically unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenProblem {
    Length { expected: usize, actual: usize },
    Charset(char),
}

impl std::fmt::Display for TokenProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenProblem::Length { expected, actual } => {
                write!(f, "length {actual}, expected {expected}")
            }
            TokenProblem::Charset(c) => write!(f, "character {c:?} outside [A-Za-z0-9_-]"),
        }
    }
}

/// Result of [`validate_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCheck {
    pub problem: Option<TokenProblem>,
    /// Denylisted substring found in an otherwise valid token.
    pub suspicious_marker: Option<&'static str>,
}

impl TokenCheck {
    pub fn is_valid(&self) -> bool {
        self.problem.is_none()
    }

    pub fn is_suspicious(&self) -> bool {
        self.suspicious_marker.is_some()
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Check length and charset, and look for denylisted substrings.
///
/// Suspicious tokens stay valid; the caller decides what to do with the flag.
pub fn validate_token(token: &str) -> TokenCheck {
    if let Some(c) = token.chars().find(|c| !is_token_char(*c)) {
        return TokenCheck {
            problem: Some(TokenProblem::Charset(c)),
            suspicious_marker: None,
        };
    }
    if token.len() != TOKEN_LEN {
        return TokenCheck {
            problem: Some(TokenProblem::Length {
                expected: TOKEN_LEN,
                actual: token.len(),
            }),
            suspicious_marker: None,
        };
    }

    let lower = token.to_ascii_lowercase();
    let suspicious_marker = SUSPICIOUS_MARKERS
        .iter()
        .copied()
        .find(|m| lower.contains(m));

    TokenCheck {
        problem: None,
        suspicious_marker,
    }
}

/// Draw a token from `rng`. Fails only if the source itself fails.
pub fn generate_token<R: RngCore + ?Sized>(rng: &mut R) -> Result<String, rand::Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Fallback token seeded from time, pid and a process counter. Same length
/// and charset as a real token, prefixed with [`DEGRADED_PREFIX`].
pub(crate) fn degraded_token(now_ms: u64) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let seed = now_ms
        ^ (u64::from(std::process::id()) << 32)
        ^ n.wrapping_mul(0x9E37_79B9_7F4A_7C15);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);
    let body = URL_SAFE_NO_PAD.encode(bytes);
    format!(
        "{DEGRADED_PREFIX}{}",
        &body[..TOKEN_LEN - DEGRADED_PREFIX.len()]
    )
}
