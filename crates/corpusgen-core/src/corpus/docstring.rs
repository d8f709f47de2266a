//! Docstring evaluation and the documentation language filter.

use std::sync::LazyLock;

use regex::Regex;

use crate::syntax::tree::{NodeId, SyntaxTree};

static NON_LATIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]").unwrap());

const TAB_SIZE: usize = 8;

/// True when the text contains CJK-script characters.
pub fn is_non_latin(text: &str) -> bool {
    NON_LATIN_RE.is_match(text)
}

/// The docstring statement of a `block`, if its first statement is a bare
/// string expression.
pub fn docstring_statement(tree: &SyntaxTree, block: NodeId) -> Option<NodeId> {
    let first = *tree.children(block).first()?;
    if tree.kind(first) != "expression_statement" {
        return None;
    }
    match tree.children(first) {
        [only] if matches!(tree.kind(*only), "string" | "concatenated_string") => Some(first),
        _ => None,
    }
}

/// Value of a docstring statement, cleaned like Python's `inspect.cleandoc`
/// with tabs expanded. `None` for byte strings and f-strings.
pub fn docstring_text(tree: &SyntaxTree, statement: NodeId) -> Option<String> {
    let expression = *tree.children(statement).first()?;
    let value = match tree.kind(expression) {
        "string" => string_value(tree.text(expression)?)?,
        "concatenated_string" => tree
            .children(expression)
            .iter()
            .map(|&part| tree.text(part).and_then(string_value))
            .collect::<Option<Vec<_>>>()?
            .concat(),
        _ => return None,
    };
    Some(clean_docstring(&value))
}

/// Evaluate a Python string literal's text.
pub fn string_value(literal: &str) -> Option<String> {
    let quote_start = literal.find(['\'', '"'])?;
    let prefix = literal[..quote_start].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }
    let raw = prefix.contains('r');

    let quoted = &literal[quote_start..];
    let delimiter = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        &quoted[..3]
    } else {
        &quoted[..1]
    };
    let content = quoted.strip_prefix(delimiter)?.strip_suffix(delimiter)?;

    Some(if raw {
        content.to_string()
    } else {
        unescape(content)
    })
}

fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(next),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width)
                    .filter_map(|_| chars.next_if(char::is_ascii_hexdigit))
                    .collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if digits.len() == width => out.push(decoded),
                    _ => {
                        out.push('\\');
                        out.push(next);
                        out.push_str(&digits);
                    }
                }
            }
            '0'..='7' => {
                let mut digits = next.to_string();
                while digits.len() < 3 {
                    match chars.next_if(|c| ('0'..='7').contains(c)) {
                        Some(d) => digits.push(d),
                        None => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

/// Expand tabs, drop the common indentation of every line after the first
/// and trim leading and trailing blank lines.
pub fn clean_docstring(doc: &str) -> String {
    let lines: Vec<String> = doc.lines().map(expand_tabs).collect();
    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                line.trim_start()
            } else {
                line.get(margin..).unwrap_or_else(|| line.trim_start())
            }
        })
        .collect();

    while cleaned.first().is_some_and(|line| line.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_SIZE - column % TAB_SIZE;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}
