//! Text sanitization. Both modes are idempotent.

use crate::config::SanitizeMode;

use super::patterns::{ANY_TAG, SCRIPT_BLOCK};

/// Sanitize `text` according to `mode`.
pub fn sanitize(text: &str, mode: SanitizeMode) -> String {
    match mode {
        SanitizeMode::StripMarkup => strip_markup(text),
        SanitizeMode::EscapeOnly => escape_markup(text),
    }
}

/// Allow-nothing cleanup: drops script/style blocks with their bodies, every
/// other tag, stray angle brackets and NULs. The output never contains `<`
/// or `>`, so a second pass is a no-op.
pub fn strip_markup(text: &str) -> String {
    let without_blocks = SCRIPT_BLOCK.replace_all(text, "");
    let without_tags = ANY_TAG.replace_all(&without_blocks, "");
    without_tags
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\0'))
        .collect()
}

/// Entity-escape the characters that can open markup or attributes.
/// `&` is left alone so entities survive a second pass unchanged.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_removes_script_with_body() {
        assert_eq!(strip_markup("hi <script>alert(1)</script> there"), "hi  there");
        assert_eq!(strip_markup("<STYLE>body{}</STYLE>ok"), "ok");
    }

    #[test]
    fn strip_removes_tags_keeps_text() {
        assert_eq!(strip_markup("<b>bold</b> move"), "bold move");
        assert_eq!(strip_markup("a <img src=x onerror=y> b"), "a  b");
    }

    #[test]
    fn strip_drops_stray_brackets() {
        assert_eq!(strip_markup("3 < 5 and 7 > 2"), "3  5 and 7  2");
        assert_eq!(strip_markup("<!-- note -->text"), "text");
        assert_eq!(strip_markup("<<b>script>"), "script");
        assert_eq!(strip_markup("nul\0byte"), "nulbyte");
    }

    #[test]
    fn escape_covers_every_special_char() {
        assert_eq!(
            escape_markup(r#"<a href="x" title='y'>/\`=</a>"#),
            "&lt;a href&#x3D;&quot;x&quot; title&#x3D;&#x27;y&#x27;&gt;&#x2F;&#x5C;&#x60;&#x3D;&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn escape_leaves_plain_text_and_ampersands() {
        assert_eq!(escape_markup("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(escape_markup("&lt;"), "&lt;");
    }

    #[test]
    fn both_modes_are_idempotent_on_samples() {
        let samples = [
            "<script>alert(1)</script>",
            "<<script>>",
            "a/b=c 'd' \"e\" `f`",
            "&amp;&lt;",
            "plain gossip",
        ];
        for s in samples {
            for mode in [SanitizeMode::StripMarkup, SanitizeMode::EscapeOnly] {
                let once = sanitize(s, mode);
                assert_eq!(sanitize(&once, mode), once, "{mode:?} on {s:?}");
            }
        }
    }
}
