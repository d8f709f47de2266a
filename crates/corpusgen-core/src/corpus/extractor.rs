//! Declaration discovery and per-file record extraction.

use std::path::Path;

use tracing::debug;

use crate::config::ExtractionMode;
use crate::corpus::docstring::{docstring_statement, docstring_text, is_non_latin};
use crate::corpus::encoder::{encode_declaration, encode_documentation};
use crate::errors::{CorpusError, CorpusResult};
use crate::models::{Provenance, SourceRecord};
use crate::syntax::parser::parse_python;
use crate::syntax::tree::{NodeId, SyntaxTree};

// ---------------------------------------------------------------------------
// Declaration kinds
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
    Module,
    Class,
    Function,
}

/// Classify a statement, unwrapping decorators. Returns the kind and the
/// underlying definition node.
pub fn classify(tree: &SyntaxTree, id: NodeId) -> Option<(DeclarationKind, NodeId)> {
    match tree.kind(id) {
        "module" => Some((DeclarationKind::Module, id)),
        "class_definition" => Some((DeclarationKind::Class, id)),
        "function_definition" => Some((DeclarationKind::Function, id)),
        "decorated_definition" => {
            let definition = *tree.children(id).last()?;
            match classify(tree, definition)? {
                (DeclarationKind::Module, _) => None,
                found => Some(found),
            }
        }
        _ => None,
    }
}

/// A function or method found in a file, with ids into the file's tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Outermost node: the `decorated_definition` when decorated.
    pub node: NodeId,
    pub decorators: usize,
    /// The docstring statement at the head of the body.
    pub docstring: Option<NodeId>,
    /// 1-based line of the `def` keyword.
    pub line: usize,
    /// Line of the innermost enclosing class.
    pub class_line: Option<usize>,
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// Collect declarations in source order.
///
/// Module-level functions are taken in `Functions` mode only; functions in
/// class bodies (nested classes included) are taken in both modes. Bodies of
/// functions are never searched.
pub fn find_declarations(tree: &SyntaxTree, mode: ExtractionMode) -> Vec<Declaration> {
    let mut found = Vec::new();
    if tree.is_empty() {
        return found;
    }
    collect(tree, SyntaxTree::ROOT, None, mode, &mut found);
    found
}

fn collect(
    tree: &SyntaxTree,
    container: NodeId,
    class_line: Option<usize>,
    mode: ExtractionMode,
    found: &mut Vec<Declaration>,
) {
    for &statement in tree.children(container) {
        let Some((kind, definition)) = classify(tree, statement) else {
            continue;
        };
        match kind {
            DeclarationKind::Class => {
                if let Some(body) = tree.child_of_kind(definition, "block") {
                    collect(tree, body, Some(tree.line(definition)), mode, found);
                }
            }
            DeclarationKind::Function => {
                if class_line.is_none() && mode == ExtractionMode::Methods {
                    continue;
                }
                let decorators = tree
                    .children(statement)
                    .iter()
                    .filter(|&&child| tree.kind(child) == "decorator")
                    .count();
                let docstring = tree
                    .child_of_kind(definition, "block")
                    .and_then(|body| docstring_statement(tree, body));
                found.push(Declaration {
                    node: statement,
                    decorators,
                    docstring,
                    line: tree.line(definition),
                    class_line,
                });
            }
            DeclarationKind::Module => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Build the record for one declaration.
///
/// `Ok(None)` is the silent filter: no docstring, a non-Latin docstring, or
/// an empty encoded field.
pub fn encode_record(
    tree: &SyntaxTree,
    declaration: &Declaration,
    path: &str,
) -> CorpusResult<Option<SourceRecord>> {
    let Some(statement) = declaration.docstring else {
        return Ok(None);
    };
    let Some(doc) = docstring_text(tree, statement) else {
        return Ok(None);
    };
    if is_non_latin(&doc) {
        return Ok(None);
    }

    let encoded = encode_declaration(tree, declaration)?;
    let documentation = encode_documentation(&doc);
    if encoded.signature.is_empty() || encoded.body.is_empty() || documentation.is_empty() {
        return Ok(None);
    }

    Ok(Some(SourceRecord {
        signature: encoded.signature,
        body: encoded.body,
        documentation,
        provenance: Provenance::new(path, declaration.line, declaration.class_line),
    }))
}

/// Extract every record from one file's source. A declaration that fails to
/// encode is logged and skipped; only a file-level parse failure is an error.
pub fn extract_source(
    source: &str,
    path: &str,
    mode: ExtractionMode,
) -> CorpusResult<Vec<SourceRecord>> {
    let tree = parse_python(source)?;
    let records = find_declarations(&tree, mode)
        .iter()
        .filter_map(|declaration| match encode_record(&tree, declaration, path) {
            Ok(record) => record,
            Err(e) => {
                debug!(path, line = declaration.line, error = %e, "Skipping declaration");
                None
            }
        })
        .collect();
    Ok(records)
}

/// Read `root/relative_path` and extract its records; provenance carries the
/// relative path.
pub fn extract_file(
    root: &Path,
    relative_path: &str,
    mode: ExtractionMode,
) -> CorpusResult<Vec<SourceRecord>> {
    let absolute = root.join(relative_path);
    let source = std::fs::read_to_string(&absolute)
        .map_err(|e| CorpusError::Extract(format!("Failed to read {}: {e}", absolute.display())))?;
    extract_source(&source, relative_path, mode)
        .map_err(|e| CorpusError::Extract(format!("{relative_path}: {e}")))
}
