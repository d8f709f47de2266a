//! Python parsing wrapper used by both pipeline stages.

use crate::errors::{CorpusError, CorpusResult};
use crate::syntax::tree::SyntaxTree;

/// Parse Python source into an owned [`SyntaxTree`].
///
/// Any error or missing node makes the whole parse fail; a partially
/// recovered tree would render into code that no longer means the same thing.
pub fn parse_python(source: &str) -> CorpusResult<SyntaxTree> {
    let normalized;
    let source = if source.contains('\r') {
        normalized = source.replace("\r\n", "\n").replace('\r', "\n");
        normalized.as_str()
    } else {
        source
    };

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| CorpusError::Parse(format!("Failed to set language: {e}")))?;

    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| CorpusError::Parse("Parser returned no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(root.start_position().row + 1);
        return Err(CorpusError::Parse(format!("Syntax error near line {line}")));
    }

    Ok(SyntaxTree::from_tree_sitter(root, source))
}

fn first_error_line(root: tree_sitter::Node<'_>) -> Option<usize> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
