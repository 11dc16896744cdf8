//! `subguard scan` – print the threat report for some text.

use anyhow::Result;
use subguard_core::content::ContentThreatScanner;

pub fn run_scan(scanner: &ContentThreatScanner, text: &str) -> Result<()> {
    let report = scanner.scan(text);
    println!("risk:      {}", report.risk_level);
    if report.findings.is_empty() {
        println!("threats:   none");
    } else {
        println!("{:<20} {}", "THREAT", "SIGNATURE");
        for f in &report.findings {
            println!("{:<20} {}", f.kind.to_string(), f.signature);
        }
    }
    if let Some(reason) = scanner.blocking_reason(&report) {
        println!("blocks:    {reason}");
    }
    println!("sanitized: {}", report.sanitized_content);
    Ok(())
}
