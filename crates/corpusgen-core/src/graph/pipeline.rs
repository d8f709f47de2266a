//! Graph stage: decoded corpus records in, [`GraphRecord`]s out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use tracing::{info, warn};

use crate::config::{Execution, GraphConfig};
use crate::corpus::decoder::{decode, decode_documentation};
use crate::errors::{CorpusError, CorpusResult};
use crate::graph::builder::GraphBuilder;
use crate::graph::tokenizer::tokenize_docstring;
use crate::models::{Edge, GraphRecord, SourceRecord};
use crate::persist::{read_payload, write_payload};
use crate::syntax::parser::parse_python;
use crate::worker::{isolate, run_units};

const PROGRESS_EVERY: usize = 100;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphBuildReport {
    pub graphs: Vec<GraphRecord>,
    pub attempted: usize,
    pub failed: usize,
}

impl GraphBuildReport {
    /// Successful graphs over input records; `0.0` for an empty input.
    pub fn yield_ratio(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.graphs.len() as f64 / self.attempted as f64
    }
}

/// Build the graph record for one corpus record.
pub fn process_record<B: GraphBuilder + ?Sized>(
    record: &SourceRecord,
    builder: &B,
) -> CorpusResult<GraphRecord> {
    let body = decode(&record.body);
    let tree = parse_python(&body).map_err(|e| {
        CorpusError::Graph(format!("{}: body does not re-parse: {e}", record.provenance))
    })?;
    let graph = builder
        .build(&tree)
        .map_err(|e| CorpusError::Graph(format!("{}: {e}", record.provenance)))?;

    let edges = graph
        .edges
        .iter()
        .flat_map(|(&(origin, destination), kinds)| {
            kinds.iter().map(move |kind| Edge {
                kind: kind.clone(),
                origin,
                destination,
            })
        })
        .collect();
    let node_labels = graph
        .node_labels
        .into_values()
        .map(|label| label.trim().to_string())
        .collect();
    let docs_words = tokenize_docstring(&decode_documentation(&record.documentation));

    Ok(GraphRecord {
        edges,
        backbone_sequence: graph.backbone,
        node_labels,
        docs_words,
    })
}

/// Build graphs for every record. Failed records are logged and dropped.
pub fn build<B: GraphBuilder + ?Sized>(
    records: &[SourceRecord],
    builder: &B,
    execution: Execution,
    workers: usize,
) -> GraphBuildReport {
    let done = AtomicUsize::new(0);
    let total = records.len();

    let outcomes = run_units(records, execution, workers, |index, record| {
        let outcome = isolate(|| process_record(record, builder));
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        if finished % PROGRESS_EVERY == 0 {
            info!(finished, total, "Graph progress");
        }
        (index, outcome)
    });

    let mut report = GraphBuildReport {
        attempted: total,
        ..GraphBuildReport::default()
    };
    for (index, outcome) in outcomes {
        match outcome {
            Ok(graph) => report.graphs.push(graph),
            Err(e) => {
                warn!(record = index, error = %e, "Graph construction failed");
                report.failed += 1;
            }
        }
    }
    report
}

/// Read the corpus at the configured input, build graphs and overwrite the
/// dataset at the configured output.
pub fn build_dataset<B: GraphBuilder + ?Sized>(
    config: &GraphConfig,
    builder: &B,
) -> CorpusResult<GraphBuildReport> {
    let start = Instant::now();
    let config = config.normalized()?;

    let records: Vec<SourceRecord> = read_payload(&config.input_path)?;
    let report = build(&records, builder, config.execution, config.workers);
    write_payload(&config.output_path, &report.graphs)?;

    info!(
        graphs = report.graphs.len(),
        snippets = report.attempted,
        yield_ratio = report.yield_ratio(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Generated {} graphs out of {} snippets",
        report.graphs.len(),
        report.attempted
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{AstGraphBuilder, SyntaxGraph};
    use crate::models::Provenance;
    use crate::syntax::tree::SyntaxTree;

    /// Labels and backbone only, no edges.
    struct EdgelessBuilder;

    impl GraphBuilder for EdgelessBuilder {
        fn build(&self, tree: &SyntaxTree) -> CorpusResult<SyntaxGraph> {
            let mut graph = SyntaxGraph::default();
            for id in tree.preorder() {
                graph
                    .node_labels
                    .insert(id, format!(" {} ", tree.text(id).unwrap_or(tree.kind(id))));
            }
            graph.backbone = vec![SyntaxTree::ROOT];
            Ok(graph)
        }
    }

    struct FailingBuilder;

    impl GraphBuilder for FailingBuilder {
        fn build(&self, _tree: &SyntaxTree) -> CorpusResult<SyntaxGraph> {
            Err(CorpusError::Graph("unsupported".to_string()))
        }
    }

    fn record(body: &str, documentation: &str) -> SourceRecord {
        SourceRecord {
            signature: "def f ( ) :".to_string(),
            body: body.to_string(),
            documentation: documentation.to_string(),
            provenance: Provenance::new("a.py", 1, None),
        }
    }

    #[test]
    fn test_edgeless_builder_still_yields_record() {
        let graph = process_record(&record("return 1", "'Doc.'"), &EdgelessBuilder).unwrap();
        assert!(graph.edges.is_empty());
        assert_eq!(graph.backbone_sequence, vec![0]);
        assert_eq!(graph.node_labels[0], "module");
        assert!(graph.node_labels.contains(&"return".to_string()));
        assert_eq!(graph.docs_words, vec!["Doc", "."]);
    }

    #[test]
    fn test_process_record_decodes_nested_body() {
        let body = "if x : DCNL  DCSP return 1 DCNL return 2";
        let graph = process_record(&record(body, "'Pick DCNL a value.'"), &AstGraphBuilder).unwrap();
        assert!(!graph.edges.is_empty());
        assert!(graph.edges.iter().any(|e| e.kind == "next_token"));
        assert_eq!(graph.docs_words, vec!["Pick", "a", "value", "."]);
        let backbone: Vec<&str> = graph
            .backbone_sequence
            .iter()
            .map(|&id| graph.node_labels[id].as_str())
            .collect();
        assert_eq!(backbone, vec!["if", "x", ":", "return", "1", "return", "2"]);
    }

    #[test]
    fn test_unparseable_body_is_dropped() {
        let records = vec![
            record("return 1", "'One.'"),
            record("return (", "'Broken.'"),
            record("return 3", "'Three.'"),
        ];
        for execution in [Execution::Sequential, Execution::Parallel] {
            let report = build(&records, &AstGraphBuilder, execution, 2);
            assert_eq!(report.attempted, 3);
            assert_eq!(report.failed, 1);
            assert_eq!(report.graphs.len(), 2);
            assert!((report.yield_ratio() - 2.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_builder_failure_is_contained() {
        let report = build(
            &[record("return 1", "'One.'")],
            &FailingBuilder,
            Execution::Sequential,
            1,
        );
        assert!(report.graphs.is_empty());
        assert_eq!(report.failed, 1);
        assert_eq!(report.yield_ratio(), 0.0);
    }

    #[test]
    fn test_sequential_build_keeps_order() {
        let records = vec![record("return 1", "'One.'"), record("return 2", "'Two.'")];
        let report = build(&records, &AstGraphBuilder, Execution::Sequential, 1);
        let words: Vec<&str> = report
            .graphs
            .iter()
            .map(|g| g.docs_words[0].as_str())
            .collect();
        assert_eq!(words, vec!["One", "Two"]);
    }

    #[test]
    fn test_empty_input_yield_ratio() {
        let report = build(&[], &AstGraphBuilder, Execution::Parallel, 2);
        assert_eq!(report.attempted, 0);
        assert_eq!(report.yield_ratio(), 0.0);
    }

    #[test]
    fn test_build_dataset_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.bin");
        let output = dir.path().join("graphs.json");
        write_payload(&input, &vec![record("return 1", "'One.'")]).unwrap();

        let config = GraphConfig::new(&input, &output).with_workers(1);
        let report = build_dataset(&config, &AstGraphBuilder).unwrap();
        assert_eq!(report.graphs.len(), 1);

        let stored: Vec<GraphRecord> = read_payload(&output).unwrap();
        assert_eq!(stored, report.graphs);
        let raw = std::fs::read_to_string(&output).unwrap();
        assert!(raw.contains("\"edges\":[[\"child\",0,"));
    }

    #[test]
    fn test_build_dataset_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = GraphConfig::new(dir.path().join("nope.bin"), dir.path().join("out.bin"));
        assert!(build_dataset(&config, &AstGraphBuilder).is_err());
    }
}
