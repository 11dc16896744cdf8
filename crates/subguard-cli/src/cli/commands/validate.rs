//! `subguard validate` – run a submission through every stage.

use anyhow::{bail, Result};
use subguard_core::store::KeyValueStore;
use subguard_core::{SecurityPipeline, SubmissionVerdict};

pub fn run_validate<S: KeyValueStore>(
    pipeline: &mut SecurityPipeline<S>,
    content: &str,
    urls: &[String],
    action: &str,
) -> Result<()> {
    match pipeline.validate(content, urls, action) {
        SubmissionVerdict::Accepted(a) => {
            println!("accepted (risk {})", a.risk_level);
            println!("content: {}", a.sanitized_content);
            for url in &a.accepted_urls {
                println!("url:     {url}");
            }
            println!("token:   {}", a.token.value);
            for w in &a.warnings {
                println!("warning: {w}");
            }
            Ok(())
        }
        SubmissionVerdict::Rejected(r) => {
            if !r.threats.is_empty() {
                let threats: Vec<String> = r.threats.iter().map(ToString::to_string).collect();
                println!("threats: {} (risk {})", threats.join(", "), r.risk_level);
            }
            bail!("rejected at {} stage: {}", r.stage, r.error)
        }
    }
}
