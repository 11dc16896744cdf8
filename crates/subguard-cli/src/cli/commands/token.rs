//! `subguard token` – show, validate or clear the anonymous token.

use anyhow::{bail, Result};
use subguard_core::store::KeyValueStore;
use subguard_core::SecurityPipeline;

pub fn run_token<S: KeyValueStore>(
    pipeline: &mut SecurityPipeline<S>,
    validate: Option<&str>,
    clear: bool,
) -> Result<()> {
    if clear {
        pipeline.clear_token()?;
        println!("Token cleared.");
        return Ok(());
    }

    if let Some(token) = validate {
        let check = pipeline.validate_token(token);
        if let Some(marker) = check.suspicious_marker {
            println!("warning: contains suspicious marker {marker:?}");
        }
        return match check.problem {
            None => {
                println!("valid");
                Ok(())
            }
            Some(problem) => bail!("invalid token: {problem}"),
        };
    }

    let outcome = pipeline.get_or_create_token();
    println!("{}", outcome.token.value);
    if outcome.created {
        println!("(new token)");
    }
    if let Some(expires) = outcome.token.expires_at_ms {
        println!("expires at {expires} ms since epoch");
    }
    for a in &outcome.advisories {
        println!("warning: {a}");
    }
    Ok(())
}
