//! `subguard rate-limit` – inspect, reset or clean up rate windows.

use anyhow::Result;
use subguard_core::store::KeyValueStore;
use subguard_core::SecurityPipeline;

pub fn run_rate_limit<S: KeyValueStore>(
    pipeline: &mut SecurityPipeline<S>,
    action: &str,
    reset: bool,
    cleanup: bool,
) -> Result<()> {
    if reset {
        pipeline.reset_rate_limit(action)?;
        println!("Rate limit for {action} reset.");
        return Ok(());
    }

    if cleanup {
        let removed = pipeline.cleanup_stale()?;
        println!("Removed {removed} stale window(s).");
    }

    let status = pipeline.rate_limit_status(action)?;
    println!(
        "{action}: {}/{} used, {} remaining, window closes in {}s",
        status.count,
        status.max,
        status.remaining(),
        status.retry_after_ms / 1000
    );
    Ok(())
}
