//! Control-token escaping and indentation flattening.
//!
//! Four sentinel words carry structure through a flat string: `DCQT`
//! (escape), `DCNL` (newline), `DCSP` (space) and `DCTB` (tab). Raw text that
//! already contains a sentinel gets it prefixed with `DCQT` first; only then
//! are structural sentinels inserted. Every structural sentinel is written
//! with a space on both sides (` DCNL `), while escaped raw sentinels never
//! are, which is what makes [`crate::corpus::decoder::decode`] unambiguous.

use crate::corpus::extractor::Declaration;
use crate::errors::{CorpusError, CorpusResult};
use crate::syntax::render::{render_lines, INDENT_UNIT};
use crate::syntax::tree::{NodeId, SyntaxTree};

pub const QUOTE: &str = "DCQT";
pub const NEWLINE: &str = "DCNL";
pub const SPACE: &str = "DCSP";
pub const TAB: &str = "DCTB";

/// Every sentinel, escape sentinel first.
pub const SENTINELS: [&str; 4] = [QUOTE, NEWLINE, SPACE, TAB];

pub const LINE_SEPARATOR: &str = " DCNL ";
pub const SPACE_MARKER: &str = " DCSP ";
pub const TAB_MARKER: &str = " DCTB ";

/// One marker per indentation level in encoded bodies.
pub const INDENT_MARKER: &str = SPACE_MARKER;

/// Encoded header and body of one declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedDeclaration {
    pub signature: String,
    pub body: String,
}

/// Prefix every pre-existing sentinel occurrence with the escape sentinel.
///
/// `DCQT` is doubled before anything else so the prefixes added for the
/// other sentinels are not themselves escaped again.
pub fn escape_sentinels(text: &str) -> String {
    let mut escaped = text.replace(QUOTE, &format!("{QUOTE}{QUOTE}"));
    for sentinel in &SENTINELS[1..] {
        escaped = escaped.replace(sentinel, &format!("{QUOTE}{sentinel}"));
    }
    escaped
}

/// Rewrite one string literal token: escape collisions, then turn literal
/// spaces, tabs and newlines into structural sentinels.
pub fn escape_string_literal(literal: &str) -> String {
    let escaped = escape_sentinels(literal);
    let mut out = String::with_capacity(escaped.len() * 2);
    for ch in escaped.chars() {
        match ch {
            ' ' => out.push_str(SPACE_MARKER),
            '\t' => out.push_str(TAB_MARKER),
            '\n' => out.push_str(LINE_SEPARATOR),
            other => out.push(other),
        }
    }
    out
}

/// Pure escaping pass over a declaration tree: string literals get
/// [`escape_string_literal`], every other token only collision escaping.
pub fn escape_string_literals(tree: &SyntaxTree) -> SyntaxTree {
    tree.map_tokens(|node, text| {
        if node.kind == "string" {
            escape_string_literal(text)
        } else {
            escape_sentinels(text)
        }
    })
}

/// Replace leading indentation with one `separator` per 4-space unit.
pub fn reduce_indentation(line: &str, separator: &str) -> String {
    let line = line.trim_end();
    let stripped = line.trim_start();
    let levels = (line.len() - stripped.len()) / INDENT_UNIT.len();
    let mut out = separator.repeat(levels);
    out.push_str(stripped);
    out
}

/// Encode a raw docstring.
///
/// Lines are trimmed; blank lines and lines without any alphanumeric
/// character (rules like `-----`) are dropped. Returns an empty string when
/// nothing survives, otherwise a single-quoted literal.
pub fn encode_documentation(raw: &str) -> String {
    let lines: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().any(char::is_alphanumeric))
        .map(escape_sentinels)
        .collect();
    if lines.is_empty() {
        return String::new();
    }

    let joined = lines.join(LINE_SEPARATOR);
    let mut quoted = String::with_capacity(joined.len() + 2);
    quoted.push('\'');
    for ch in joined.chars() {
        if ch == '\\' || ch == '\'' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Encode a function declaration into its signature and body strings.
///
/// The header occupies the first `decorators + 1` rendered lines. The
/// docstring statement is left out of the body and body lines are re-based
/// so top-level statements carry no indentation marker.
pub fn encode_declaration(
    tree: &SyntaxTree,
    declaration: &Declaration,
) -> CorpusResult<EncodedDeclaration> {
    // Pre-order ids make a subtree a contiguous id range.
    let relative = |id: NodeId| {
        id.checked_sub(declaration.node).ok_or_else(|| {
            CorpusError::Extract(format!(
                "Node {id} lies outside declaration at node {}",
                declaration.node
            ))
        })
    };

    let escaped = escape_string_literals(&tree.subtree(declaration.node));
    let skip = match declaration.docstring {
        Some(statement) => vec![relative(statement)?],
        None => Vec::new(),
    };
    let lines = render_lines(&escaped, SyntaxTree::ROOT, &skip);

    let header_len = declaration.decorators + 1;
    if lines.len() < header_len {
        return Err(CorpusError::Extract(format!(
            "Declaration at line {} rendered {} lines, expected at least {header_len}",
            declaration.line,
            lines.len()
        )));
    }
    let def_line = lines[header_len - 1].trim_start();
    if !(def_line.starts_with("def ") || def_line.starts_with("async ")) {
        return Err(CorpusError::Extract(format!(
            "Declaration at line {} has no def header after {} decorators",
            declaration.line, declaration.decorators
        )));
    }

    let signature = lines[..header_len].join(LINE_SEPARATOR);
    let body = lines[header_len..]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let line = line.strip_prefix(INDENT_UNIT).unwrap_or(line);
            reduce_indentation(line, INDENT_MARKER)
        })
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR);

    Ok(EncodedDeclaration { signature, body })
}
