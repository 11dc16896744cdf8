use rand::rngs::OsRng;
use rand::RngCore;

use crate::clock::SharedClock;
use crate::config::TokenConfig;
use crate::error::GuardError;
use crate::store::{read_record, write_record, KeyValueStore, StoreError};

use super::{degraded_token, generate_token, validate_token, AnonymousToken, TokenCheck};

/// Storage key of the persisted token record.
pub const TOKEN_KEY: &str = "subguard.token";

/// What [`TokenManager::get_or_create`] handed back.
#[derive(Debug, Clone)]
pub struct TokenOutcome {
    pub token: AnonymousToken,
    /// A new value was generated on this call.
    pub created: bool,
    /// Problems that were healed along the way.
    pub advisories: Vec<GuardError>,
}

/// Creates, validates and persists the anonymous token.
///
/// Policy: suspicious tokens are logged and kept; every persisted token has
/// an expiry, optionally sliding forward on each read.
pub struct TokenManager {
    config: TokenConfig,
    clock: SharedClock,
    rng: Box<dyn RngCore + Send>,
}

impl TokenManager {
    pub fn new(config: TokenConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            rng: Box::new(OsRng),
        }
    }

    /// Replace the random source.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Fresh token value from the secure source.
    pub fn generate(&mut self) -> Result<String, GuardError> {
        generate_token(&mut *self.rng)
            .map_err(|e| GuardError::StorageUnavailable(format!("secure random source: {e}")))
    }

    pub fn validate(&self, token: &str) -> TokenCheck {
        let check = validate_token(token);
        if let Some(marker) = check.suspicious_marker {
            tracing::warn!(marker, "anonymous token contains a denylisted marker");
        }
        check
    }

    /// Stored token, if any, without creating or refreshing anything.
    pub fn current<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Option<AnonymousToken>, StoreError> {
        read_record(store, TOKEN_KEY)
    }

    /// Return the persisted token, replacing it when missing, malformed or
    /// expired. Never fails: storage and entropy problems degrade to an
    /// advisory plus a marked fallback token.
    pub fn get_or_create<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> TokenOutcome {
        let now = self.clock.now_ms();
        let mut advisories = Vec::new();
        let mut fresh = None;

        match read_record::<AnonymousToken, S>(&*store, TOKEN_KEY) {
            Ok(Some(stored)) => {
                let check = self.validate(&stored.value);
                if let Some(problem) = check.problem {
                    tracing::warn!(%problem, "stored token malformed; regenerating");
                    advisories.push(GuardError::TokenInvalid(problem.to_string()));
                } else if stored.is_expired(now) {
                    tracing::debug!("stored token expired; regenerating");
                    advisories.push(GuardError::TokenInvalid("expired".to_string()));
                } else if stored.is_degraded() {
                    match self.generate() {
                        Ok(v) => {
                            tracing::info!("secure random source back; replacing degraded token");
                            fresh = Some(v);
                        }
                        Err(_) => return self.keep(store, stored, advisories, now),
                    }
                } else {
                    return self.keep(store, stored, advisories, now);
                }
            }
            Ok(None) => {}
            Err(StoreError::Corrupt { source, .. }) => {
                tracing::warn!(error = %source, "stored token record corrupt; regenerating");
                advisories.push(GuardError::TokenInvalid("corrupt record".to_string()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "token store unreadable; issuing unpersisted token");
                advisories.push(GuardError::StorageUnavailable(e.to_string()));
            }
        }

        let value = match fresh.map_or_else(|| self.generate(), Ok) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to degraded token");
                advisories.push(e);
                degraded_token(now)
            }
        };
        let token = AnonymousToken {
            value,
            created_at_ms: now,
            expires_at_ms: Some(now.saturating_add(self.config.ttl_ms())),
        };
        self.persist(store, &token, &mut advisories);
        TokenOutcome {
            token,
            created: true,
            advisories,
        }
    }

    fn keep<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        mut token: AnonymousToken,
        mut advisories: Vec<GuardError>,
        now: u64,
    ) -> TokenOutcome {
        // Records written without an expiry get one on first read.
        if self.config.sliding_expiry || token.expires_at_ms.is_none() {
            token.expires_at_ms = Some(now.saturating_add(self.config.ttl_ms()));
            self.persist(store, &token, &mut advisories);
        }
        TokenOutcome {
            token,
            created: false,
            advisories,
        }
    }

    fn persist<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        token: &AnonymousToken,
        advisories: &mut Vec<GuardError>,
    ) {
        if let Err(e) = write_record(store, TOKEN_KEY, token) {
            tracing::warn!(error = %e, "could not persist anonymous token");
            advisories.push(GuardError::StorageUnavailable(e.to_string()));
        }
    }

    /// Remove the persisted token (logout / reset).
    pub fn clear<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        store.remove(TOKEN_KEY)?;
        tracing::info!("anonymous token cleared");
        Ok(())
    }
}
