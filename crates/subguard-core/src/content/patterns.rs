//! Threat signatures, grouped by family and compiled once.

use std::sync::LazyLock;

use regex::Regex;

/// One named regex signature.
pub(crate) struct Signature {
    pub name: &'static str,
    pub regex: Regex,
}

fn compile(specs: &[(&'static str, &str)]) -> Vec<Signature> {
    specs
        .iter()
        .map(|&(name, pattern)| Signature {
            name,
            regex: Regex::new(pattern).expect("valid threat pattern"),
        })
        .collect()
}

pub(crate) static XSS: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    compile(&[
        ("script_tag", r"(?i)<\s*/?\s*script\b"),
        ("javascript_uri", r"(?i)javascript\s*:"),
        ("data_html_uri", r"(?i)data\s*:\s*text/html"),
        ("vbscript_uri", r"(?i)vbscript\s*:"),
        ("event_handler", r"(?i)<[^>]*\bon[a-z]+\s*="),
        (
            "embedding_tag",
            r"(?i)<\s*(?:iframe|object|embed|link|style|meta|base)\b",
        ),
        ("css_expression", r"(?i)expression\s*\("),
        ("css_import", r"(?i)@import\b"),
    ])
});

pub(crate) static SQL: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    compile(&[
        ("union_select", r"(?i)\bunion\b(?:\s+all)?\s+select\b"),
        ("ddl_table", r"(?i)\b(?:drop|alter|create|truncate)\s+table\b"),
        ("insert_into", r"(?i)\binsert\s+into\b"),
        ("delete_from", r"(?i)\bdelete\s+from\b"),
        ("update_set", r"(?i)\bupdate\s+\w+\s+set\b"),
        ("comment_marker", r#"['";]\s*--|/\*|\*/"#),
        (
            "exec_call",
            r"(?i)\bexec(?:ute)?\s*\(|\bexec\s+(?:xp|sp)_\w+|\bxp_cmdshell\b",
        ),
    ])
});

pub(crate) static COMMAND: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    compile(&[
        ("pipe", r"\|"),
        ("ampersand", r"&"),
        ("semicolon", r";"),
        ("backtick", r"`"),
        ("command_substitution", r"\$\("),
        ("variable_expansion", r"\$\{"),
        ("process_substitution", r"[<>]\("),
    ])
});

pub(crate) static PATH_TRAVERSAL: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    compile(&[
        ("dot_dot", r"\.\."),
        (
            "encoded_dot_dot",
            r"(?i)%2e%2e|%2e\.|\.%2e|%252e%252e|%c0%ae%c0%ae",
        ),
    ])
});

/// Whole tags plus the bodies of script/style blocks.
pub(crate) static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*script\b[^>]*>.*?<\s*/\s*script\s*>|<\s*style\b[^>]*>.*?<\s*/\s*style\s*>")
        .expect("valid regex")
});

/// Anything that opens like a tag, comment or declaration.
pub(crate) static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z/!?][^>]*>").expect("valid regex"));

/// Names of the signatures in `family` that match `text`.
pub(crate) fn matching(family: &[Signature], text: &str) -> Vec<&'static str> {
    family
        .iter()
        .filter(|s| s.regex.is_match(text))
        .map(|s| s.name)
        .collect()
}
