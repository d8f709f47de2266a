//! Graph stage: structural graphs over decoded function bodies.

pub mod builder;
pub mod pipeline;
pub mod tokenizer;

pub use builder::{AstGraphBuilder, EdgeKind, GraphBuilder, SyntaxGraph};
pub use pipeline::{build, build_dataset, process_record, GraphBuildReport};
pub use tokenizer::tokenize_docstring;
