//! Inverse of the encoder's flattening.

use crate::corpus::encoder::{LINE_SEPARATOR, QUOTE, SENTINELS, SPACE_MARKER, TAB_MARKER};

/// Structural sentinel forms and the whitespace they stand for.
const STRUCTURAL: [(&str, &str); 3] = [
    (LINE_SEPARATOR, "\n"),
    (SPACE_MARKER, " "),
    (TAB_MARKER, "\t"),
];

/// Decode an encoded signature or body back to source text.
///
/// Scans left to right: `DCQT` followed by a sentinel yields that sentinel
/// literally, a space-delimited structural sentinel yields its whitespace,
/// anything else is copied. Indentation markers come back as one space per
/// level, so a decoded body parses without dedenting.
pub fn decode(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;

    'scan: while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix(QUOTE) {
            if let Some(sentinel) = SENTINELS.iter().find(|s| after.starts_with(**s)) {
                out.push_str(sentinel);
                rest = &after[sentinel.len()..];
                continue;
            }
        }
        for (form, raw) in STRUCTURAL {
            if let Some(after) = rest.strip_prefix(form) {
                out.push_str(raw);
                rest = after;
                continue 'scan;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Decode an encoded documentation literal: strip the single-quote wrapper
/// and its backslash escapes, then [`decode`].
pub fn decode_documentation(encoded: &str) -> String {
    let inner = encoded
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(encoded);

    let mut unquoted = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                unquoted.push(escaped);
                continue;
            }
        }
        unquoted.push(ch);
    }

    decode(&unquoted)
}
