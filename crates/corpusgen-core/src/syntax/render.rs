//! Canonical source rendering of a [`SyntaxTree`].
//!
//! Every logical line becomes `INDENT_UNIT * depth` followed by its tokens
//! joined with single spaces. Bracketed continuation lines collapse onto the
//! statement's line and single-line compound statements are split, so the
//! output is always valid Python with one statement per line.

use crate::syntax::tree::{NodeId, SyntaxTree};

pub const INDENT_UNIT: &str = "    ";

enum Step {
    Visit(NodeId),
    Flush,
    Dedent,
}

struct LineWriter {
    lines: Vec<String>,
    current: Vec<String>,
    depth: usize,
}

impl LineWriter {
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut line = INDENT_UNIT.repeat(self.depth);
        line.push_str(&self.current.join(" "));
        self.lines.push(line);
        self.current.clear();
    }
}

/// Render the subtree at `root` into lines, omitting any node in `skip`.
pub fn render_lines(tree: &SyntaxTree, root: NodeId, skip: &[NodeId]) -> Vec<String> {
    let mut writer = LineWriter {
        lines: Vec::new(),
        current: Vec::new(),
        depth: 0,
    };
    let mut stack = vec![Step::Flush, Step::Visit(root)];

    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Flush => {
                writer.flush();
                continue;
            }
            Step::Dedent => {
                writer.flush();
                writer.depth = writer.depth.saturating_sub(1);
                continue;
            }
            Step::Visit(id) => id,
        };
        if skip.contains(&id) {
            continue;
        }

        let node = tree.node(id);
        if let Some(text) = node.text.as_deref() {
            if !text.is_empty() {
                writer.current.push(text.to_string());
            }
            continue;
        }

        match node.kind {
            "module" | "block" => {
                if node.kind == "block" {
                    writer.flush();
                    writer.depth += 1;
                    stack.push(Step::Dedent);
                }
                for &child in node.children.iter().rev() {
                    // statement separators are implied by the line breaks
                    if tree.kind(child) == ";" {
                        continue;
                    }
                    stack.push(Step::Flush);
                    stack.push(Step::Visit(child));
                }
            }
            "decorator" => {
                stack.push(Step::Flush);
                for &child in node.children.iter().rev() {
                    stack.push(Step::Visit(child));
                }
            }
            _ => {
                for &child in node.children.iter().rev() {
                    stack.push(Step::Visit(child));
                }
            }
        }
    }

    writer.lines
}

/// Render the subtree at `root` to a newline-joined string.
pub fn render(tree: &SyntaxTree, root: NodeId, skip: &[NodeId]) -> String {
    render_lines(tree, root, skip).join("\n")
}
