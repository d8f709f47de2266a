//! Owned, arena-indexed syntax tree.
//!
//! Node ids are pre-order indices into a flat `Vec`, the root is always `0`.
//! The tree owns its token text, so it can be handed to worker threads and
//! rewritten without touching the parser's buffers.

pub type NodeId = usize;

/// Kinds that are kept as a single token even though the parser gives them
/// children. A string literal must survive as one unit so its whitespace can
/// be rewritten without being confused with token spacing.
pub const ATOMIC_KINDS: &[&str] = &["string"];

/// Kinds dropped while building the tree.
pub const SKIPPED_KINDS: &[&str] = &["comment", "line_continuation"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: &'static str,
    /// Token text; `Some` exactly when the node is a token.
    pub text: Option<String>,
    pub children: Vec<NodeId>,
    /// 1-based source line of the node's first byte.
    pub line: usize,
}

impl SyntaxNode {
    pub fn is_token(&self) -> bool {
        self.text.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub const ROOT: NodeId = 0;

    /// Build a tree from nodes already laid out in pre-order.
    pub fn from_nodes(nodes: Vec<SyntaxNode>) -> Self {
        Self { nodes }
    }

    /// Convert a tree-sitter tree. Comments and line continuations are
    /// dropped, atomic kinds keep their full source text.
    pub fn from_tree_sitter(root: tree_sitter::Node<'_>, source: &str) -> Self {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut stack: Vec<(tree_sitter::Node<'_>, Option<NodeId>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let kind = node.kind();
            if SKIPPED_KINDS.contains(&kind) {
                continue;
            }
            let atomic = node.child_count() == 0 || ATOMIC_KINDS.contains(&kind);
            let text = if atomic {
                let raw = node.utf8_text(source.as_bytes()).unwrap_or_default();
                Some(token_text(kind, raw))
            } else {
                None
            };

            let id = nodes.len();
            nodes.push(SyntaxNode {
                kind,
                text,
                children: Vec::new(),
                line: node.start_position().row + 1,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(id);
            }

            if !atomic {
                let mut cursor = node.walk();
                let children: Vec<_> = node.children(&mut cursor).collect();
                for child in children.into_iter().rev() {
                    stack.push((child, Some(id)));
                }
            }
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &'static str {
        self.nodes[id].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id].text.as_deref()
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.nodes[id].line
    }

    /// First child of the given kind.
    pub fn child_of_kind(&self, id: NodeId, kind: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.kind(child) == kind)
    }

    /// All node ids in pre-order, which is also id order.
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    /// Token ids under `id`, in source order.
    pub fn tokens(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.nodes[current].is_token() {
                out.push(current);
            } else {
                stack.extend(self.nodes[current].children.iter().rev());
            }
        }
        out
    }

    /// Copy the subtree rooted at `id` into a fresh arena, renumbered from 0.
    pub fn subtree(&self, id: NodeId) -> SyntaxTree {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(id, None)];
        while let Some((old, parent)) = stack.pop() {
            let source = &self.nodes[old];
            let new = nodes.len();
            nodes.push(SyntaxNode {
                kind: source.kind,
                text: source.text.clone(),
                children: Vec::new(),
                line: source.line,
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(new);
            }
            for &child in source.children.iter().rev() {
                stack.push((child, Some(new)));
            }
        }
        SyntaxTree { nodes }
    }

    /// Return a new tree with every token's text replaced by `f(node, text)`.
    pub fn map_tokens<F>(&self, mut f: F) -> SyntaxTree
    where
        F: FnMut(&SyntaxNode, &str) -> String,
    {
        let nodes = self
            .nodes
            .iter()
            .map(|node| SyntaxNode {
                kind: node.kind,
                text: node.text.as_deref().map(|text| f(node, text)),
                children: node.children.clone(),
                line: node.line,
            })
            .collect();
        SyntaxTree { nodes }
    }
}

/// Leaf text as stored in the tree. String literals are verbatim; any other
/// token (e.g. the `not in` operator) has its inner whitespace collapsed.
fn token_text(kind: &str, raw: &str) -> String {
    if ATOMIC_KINDS.contains(&kind) {
        raw.to_string()
    } else {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
