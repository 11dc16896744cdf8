//! Property tests: sanitization is idempotent and scanning never panics.

use proptest::prelude::*;
use subguard_core::config::{ContentConfig, SanitizeMode};
use subguard_core::content::{sanitize, ContentThreatScanner};

fn markupish() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "[<>a-z/ =\"'`\\\\!?-]{0,64}",
        "(<script>|</script>|<b>|<|>|text|&lt;| ){0,16}",
    ]
}

proptest! {
    #[test]
    fn strip_markup_is_idempotent(s in markupish()) {
        let once = sanitize(&s, SanitizeMode::StripMarkup);
        prop_assert_eq!(sanitize(&once, SanitizeMode::StripMarkup), once.clone());
        prop_assert!(!once.contains('<') && !once.contains('>'));
    }

    #[test]
    fn escape_only_is_idempotent(s in markupish()) {
        let once = sanitize(&s, SanitizeMode::EscapeOnly);
        prop_assert_eq!(sanitize(&once, SanitizeMode::EscapeOnly), once);
    }

    #[test]
    fn scan_sanitizes_with_configured_mode(s in markupish()) {
        let scanner = ContentThreatScanner::new(ContentConfig::default());
        let report = scanner.scan(&s);
        prop_assert_eq!(report.sanitized_content, sanitize(&s, SanitizeMode::StripMarkup));
    }
}
