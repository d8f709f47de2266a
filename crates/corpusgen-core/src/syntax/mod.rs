pub mod parser;
pub mod render;
pub mod tree;

pub use parser::parse_python;
pub use tree::{NodeId, SyntaxNode, SyntaxTree};
