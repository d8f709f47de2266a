//! Graph construction over a parsed body.
//!
//! [`GraphBuilder`] is the seam for plugging in a different structural
//! encoding; [`AstGraphBuilder`] is the stock one.

use std::collections::BTreeMap;

use indexmap::{IndexMap, IndexSet};

use crate::errors::CorpusResult;
use crate::syntax::tree::{NodeId, SyntaxTree};

/// Typed edges, node labels and the backbone traversal of one tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyntaxGraph {
    /// (origin, destination) to the edge types between them, in insertion order.
    pub edges: IndexMap<(usize, usize), IndexSet<String>>,
    pub node_labels: BTreeMap<usize, String>,
    pub backbone: Vec<usize>,
}

impl SyntaxGraph {
    pub fn add_edge(&mut self, kind: &str, origin: usize, destination: usize) {
        self.edges
            .entry((origin, destination))
            .or_default()
            .insert(kind.to_string());
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }
}

pub trait GraphBuilder: Send + Sync {
    fn build(&self, tree: &SyntaxTree) -> CorpusResult<SyntaxGraph>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Child,
    NextSibling,
    NextToken,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::NextSibling => "next_sibling",
            Self::NextToken => "next_token",
        }
    }
}

/// Syntax-tree graph keyed by pre-order node id.
///
/// Every node is labelled (token text for tokens, the node kind otherwise),
/// parents link to children, adjacent siblings and consecutive tokens are
/// chained, and the backbone is the token sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct AstGraphBuilder;

impl GraphBuilder for AstGraphBuilder {
    fn build(&self, tree: &SyntaxTree) -> CorpusResult<SyntaxGraph> {
        let mut graph = SyntaxGraph::default();
        if tree.is_empty() {
            return Ok(graph);
        }

        for id in tree.preorder() {
            let label = tree.text(id).unwrap_or(tree.kind(id));
            graph.node_labels.insert(id, label.to_string());

            let children = tree.children(id);
            for &child in children {
                graph.add_edge(EdgeKind::Child.as_str(), id, child);
            }
            for pair in children.windows(2) {
                graph.add_edge(EdgeKind::NextSibling.as_str(), pair[0], pair[1]);
            }
        }

        let tokens: Vec<NodeId> = tree.tokens(SyntaxTree::ROOT);
        for pair in tokens.windows(2) {
            graph.add_edge(EdgeKind::NextToken.as_str(), pair[0], pair[1]);
        }
        graph.backbone = tokens;

        Ok(graph)
    }
}
