//! Shared fixtures: a pipeline on a manual clock over an in-memory store.

use std::sync::Arc;

use subguard_core::clock::ManualClock;
use subguard_core::store::MemoryStore;
use subguard_core::{SecurityPipeline, SubguardConfig};

pub const NO_URLS: [&str; 0] = [];

/// Ten hours and one minute past the epoch, so hourly windows have room.
pub const START_MS: u64 = 10 * 3_600_000 + 60_000;

#[allow(dead_code)]
pub fn pipeline() -> (SecurityPipeline<MemoryStore>, ManualClock) {
    pipeline_with(SubguardConfig::default())
}

pub fn pipeline_with(config: SubguardConfig) -> (SecurityPipeline<MemoryStore>, ManualClock) {
    let clock = ManualClock::new(START_MS);
    let p = SecurityPipeline::with_clock(config, MemoryStore::new(), Arc::new(clock.clone()));
    (p, clock)
}
