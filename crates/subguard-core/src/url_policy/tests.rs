use super::*;
use crate::config::{DomainPolicy, UrlConfig};

fn denylist() -> UrlValidator {
    UrlValidator::new(UrlConfig::default())
}

fn allowlist() -> UrlValidator {
    UrlValidator::new(UrlConfig {
        domain_policy: DomainPolicy::Allowlist,
        ..UrlConfig::default()
    })
}

#[test]
fn github_accepted_in_both_modes() {
    for v in [denylist(), allowlist()] {
        let batch = v.validate(&["https://github.com/x"]);
        assert_eq!(batch.accepted, vec!["https://github.com/x".to_string()]);
        assert_eq!(batch.valid, batch.accepted);
        assert!(batch.invalid.is_empty());
        assert!(batch.warnings.is_empty());
    }
}

#[test]
fn script_schemes_rejected_in_both_modes() {
    for v in [denylist(), allowlist()] {
        for bad in ["javascript:alert(1)", "JavaScript:void(0)", "vbscript:msgbox", "data:text/html,hi"] {
            let verdict = v.classify(bad);
            assert_eq!(verdict.status, UrlStatus::Invalid, "{bad}");
        }
        let batch = v.validate(&["javascript:alert(1)"]);
        assert!(batch.accepted.is_empty());
        assert_eq!(batch.invalid, vec!["javascript:alert(1)".to_string()]);
        assert_eq!(batch.rejections().len(), 1);
    }
}

#[test]
fn overlong_url_rejected() {
    let long = format!("https://github.com/{}", "a".repeat(3000));
    let verdict = denylist().classify(&long);
    assert_eq!(verdict.status, UrlStatus::Invalid);
    assert!(verdict.reason.contains("2048"));
}

#[test]
fn unparsable_and_wrong_protocol_rejected() {
    let v = denylist();
    assert_eq!(v.classify("not a url").status, UrlStatus::Invalid);
    let ftp = v.classify("ftp://files.example.com/a");
    assert_eq!(ftp.status, UrlStatus::Invalid);
    assert!(ftp.reason.contains("ftp"));
    assert_eq!(v.classify("mailto:a@b.com").status, UrlStatus::Invalid);
}

#[test]
fn null_bytes_and_script_tags_rejected() {
    let v = denylist();
    assert_eq!(v.classify("https://x.com/a%00b").status, UrlStatus::Invalid);
    assert_eq!(
        v.classify("https://x.com/?q=<script>").status,
        UrlStatus::Invalid
    );
}

#[test]
fn denylist_blocks_listed_domains_and_subdomains() {
    let v = denylist();
    assert_eq!(v.classify("https://grabify.link/abc").status, UrlStatus::Invalid);
    assert_eq!(
        v.classify("https://www.iplogger.org/x").status,
        UrlStatus::Invalid
    );
    assert_eq!(v.classify("https://example.org/story").status, UrlStatus::Valid);
}

#[test]
fn denylist_flags_local_ip_and_shorteners() {
    let v = denylist();
    for (url, fragment) in [
        ("http://localhost:3000/x", "localhost"),
        ("http://127.0.0.1/x", "loopback"),
        ("http://[::1]/", "loopback"),
        ("http://93.184.216.34/", "bare IP"),
        ("https://bit.ly/3abc", "shortener"),
    ] {
        let verdict = v.classify(url);
        assert_eq!(verdict.status, UrlStatus::Suspicious, "{url}");
        assert!(verdict.reason.contains(fragment), "{url}: {}", verdict.reason);
    }

    let batch = v.validate(&["https://bit.ly/3abc"]);
    assert_eq!(batch.accepted.len(), 1);
    assert_eq!(batch.suspicious, batch.accepted);
    assert_eq!(batch.warnings.len(), 1);
}

#[test]
fn allowlist_rejects_everything_else() {
    let v = allowlist();
    assert_eq!(v.classify("https://example.org/story").status, UrlStatus::Invalid);
    assert_eq!(v.classify("https://bit.ly/3abc").status, UrlStatus::Invalid);
    assert_eq!(v.classify("http://127.0.0.1/").status, UrlStatus::Invalid);
    assert_eq!(
        v.classify("https://old.reddit.com/r/x").status,
        UrlStatus::Valid
    );
}

#[test]
fn raw_text_markers_flag_suspicious() {
    let v = denylist();
    let traversal = v.classify("https://example.org/a/../../etc/passwd");
    assert_eq!(traversal.status, UrlStatus::Suspicious);
    assert!(traversal.reason.contains("path traversal"));

    let eval = v.classify("https://example.org/?q=eval(1)");
    assert_eq!(eval.status, UrlStatus::Suspicious);
}

#[test]
fn duplicates_collapse_and_cap_applies() {
    let v = denylist();
    let batch = v.validate(&[
        "https://github.com/a",
        "https://GITHUB.com/a",
        "  ",
        "https://github.com/b",
        "https://github.com/c",
        "https://github.com/d",
        "https://github.com/e",
    ]);
    assert_eq!(
        batch.accepted,
        vec![
            "https://github.com/a".to_string(),
            "https://github.com/b".to_string(),
            "https://github.com/c".to_string(),
        ]
    );
    assert!(batch
        .warnings
        .iter()
        .any(|w| w.contains("first 3") && w.contains("2 more")));
}

#[test]
fn dropped_duplicates_and_overflow_keep_a_verdict() {
    let v = denylist();
    let batch = v.validate(&[
        "https://github.com/a",
        "https://GITHUB.com/a",
        "https://github.com/b",
        "https://github.com/c",
        "https://github.com/d",
    ]);
    assert_eq!(batch.verdicts.len(), 5);
    let kept: Vec<bool> = batch.verdicts.iter().map(|v| v.is_accepted()).collect();
    assert_eq!(kept, vec![true, false, true, true, false]);
    assert!(batch.verdicts[1].reason.contains("duplicate"));
    assert!(batch.verdicts[4].reason.contains("over cap"));
    assert_eq!(batch.verdicts[4].status, UrlStatus::Valid);
    // Neither counts as a rejected link.
    assert!(batch.rejections().is_empty());
    assert!(batch.invalid.is_empty());
}

#[test]
fn cap_is_clamped_to_hard_maximum() {
    let v = UrlValidator::new(UrlConfig {
        max_urls: 50,
        ..UrlConfig::default()
    });
    let urls: Vec<String> = (0..10).map(|i| format!("https://github.com/{i}")).collect();
    assert_eq!(v.validate(&urls).accepted.len(), MAX_URLS_CAP);
}
