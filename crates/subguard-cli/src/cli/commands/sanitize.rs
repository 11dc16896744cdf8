//! `subguard sanitize` – print sanitized text.

use anyhow::Result;
use subguard_core::content::ContentThreatScanner;

pub fn run_sanitize(scanner: &ContentThreatScanner, text: &str) -> Result<()> {
    println!("{}", scanner.sanitize(text));
    Ok(())
}
