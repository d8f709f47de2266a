//! corpusgen core library: builds a code/documentation training corpus from
//! Python sources.
//!
//! The extraction stage ([`corpus`]) walks a source tree, pulls documented
//! functions out of each file and flattens them into sentinel-encoded
//! strings. The graph stage ([`graph`]) decodes those records, re-parses the
//! bodies and turns each into a structural graph paired with tokenized
//! documentation. With the `python` feature the crate also builds the
//! `_corpusgen_core` extension module via PyO3.

pub mod config;
pub mod corpus;
pub mod errors;
pub mod graph;
pub mod models;
pub mod persist;
pub mod syntax;
pub mod worker;

#[cfg(feature = "python")]
mod python;
