//! Lexical tokenizer for documentation text.

use std::sync::LazyLock;

use regex::Regex;

// Words are runs of anything but whitespace and delimiters. Delimiter runs
// stay together; empty bracket pairs and arrows are single tokens.
static DOC_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"-+>|=+>|[^\s,'"`.():\[\]=*;>{}+\-/\\]+|\\+|\.+|\(\)|\{\}|\[\]|\(+|\)+|:+|\[+|\]+|\{+|\}+|=+|\*+|;+|>+|\++|-+|/+"#,
    )
    .unwrap()
});

/// Split documentation into word and delimiter tokens. Whitespace, commas and
/// quotes separate tokens and are never emitted.
pub fn tokenize_docstring(text: &str) -> Vec<String> {
    DOC_TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}
