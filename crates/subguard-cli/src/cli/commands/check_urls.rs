//! `subguard check-urls` – classify evidence links.

use anyhow::Result;
use subguard_core::url_policy::{UrlStatus, UrlValidator};

pub fn run_check_urls(validator: &UrlValidator, urls: &[String]) -> Result<()> {
    let batch = validator.validate(urls);
    println!("{:<11} {:<40} {}", "STATUS", "URL", "REASON");
    for v in &batch.verdicts {
        let shown = v.normalized.as_deref().unwrap_or(&v.input);
        let status = if v.kept || v.status == UrlStatus::Invalid {
            v.status.to_string()
        } else {
            "dropped".to_string()
        };
        println!("{:<11} {:<40} {}", status, shown, v.reason);
    }
    println!(
        "{} kept, {} dropped",
        batch.accepted.len(),
        batch.verdicts.len() - batch.accepted.len()
    );
    Ok(())
}
