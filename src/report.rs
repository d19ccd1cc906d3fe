//! Count reports: the serializable, fingerprinted output of one counting run.
//!
//! A report pins down everything needed to reproduce it: the fingerprint of
//! the input graph, the configuration hash, and the template that was used
//! as distance zero. `report_hash` covers all of it.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::config::KernelConfig;
use crate::counting::{count, CountTables, CountingError};
use crate::graph::{MalformedGraphError, NodeId, ReconGraph, ReconGraphInput};
use crate::template::{sample_template, Template};
use crate::types::DistanceFunction;
use crate::COPHYLO_KERNEL_SCHEMA_VERSION;

/// Error type for building a report end to end.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Input did not describe a valid reconciliation graph.
    #[error("Malformed graph: {0}")]
    Graph(#[from] MalformedGraphError),

    /// Counting failed.
    #[error("Counting failed: {0}")]
    Counting(#[from] CountingError),
}

/// Distributions recorded for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCounts {
    /// Node identity.
    pub node: NodeId,
    /// Human-readable label.
    pub label: String,
    /// Inside distribution.
    pub subcount: DistanceFunction,
    /// Outside distribution, if the config asked for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercount: Option<DistanceFunction>,
    /// Template-centred distribution through this node.
    pub count: DistanceFunction,
}

/// Result of counting one reconciliation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountReport {
    /// Schema version of this report.
    pub schema_version: String,
    /// Fingerprint of the input graph.
    pub graph_fingerprint: String,
    /// Config version used.
    pub config_version: String,
    /// Hash of the config parameters.
    pub params_hash: String,
    /// Template root label.
    pub template_root: String,
    /// Number of events in the template.
    pub template_size: usize,
    /// Number of complete reconciliations, in decimal.
    pub total_reconciliations: String,
    /// Distance distribution over all complete reconciliations.
    pub root_distribution: DistanceFunction,
    /// Per-node distributions, in node order.
    pub nodes: Vec<NodeCounts>,
    /// Hash over every other field.
    pub report_hash: String,
}

impl CountReport {
    /// Build a graph from `input`, sample a template and count.
    pub fn build(input: &ReconGraphInput, config: &KernelConfig) -> Result<Self, ReportError> {
        let graph = ReconGraph::new(input)?;
        let template = sample_template(&graph, config.template_seed);
        let tables = count(&graph, &template)?;

        let report = Self::from_tables(&graph, &template, &tables, input.fingerprint(), config);
        tracing::info!(
            graph = %report.graph_fingerprint,
            template_size = report.template_size,
            total = %report.total_reconciliations,
            report_hash = %report.report_hash,
            "count report built"
        );
        Ok(report)
    }

    /// Assemble a report from already computed tables.
    pub fn from_tables(
        graph: &ReconGraph,
        template: &Template,
        tables: &CountTables,
        graph_fingerprint: String,
        config: &KernelConfig,
    ) -> Self {
        let nodes = tables
            .counts
            .iter()
            .map(|(id, count)| NodeCounts {
                node: id,
                label: graph.label(id),
                subcount: tables.subcounts[id].clone(),
                supercount: config
                    .include_supercounts
                    .then(|| tables.supercounts[id].clone()),
                count: count.clone(),
            })
            .collect();

        let mut report = Self {
            schema_version: COPHYLO_KERNEL_SCHEMA_VERSION.to_string(),
            graph_fingerprint,
            config_version: config.config_id().to_string(),
            params_hash: config.params_hash(),
            template_root: graph.label(template.root()),
            template_size: tables.template_size,
            total_reconciliations: tables.total_reconciliations().to_string(),
            root_distribution: tables.distribution_at_root(),
            nodes,
            report_hash: String::new(),
        };
        report.report_hash = report.compute_hash();
        report
    }

    /// Counts for one node.
    pub fn node(&self, id: NodeId) -> Option<&NodeCounts> {
        self.nodes.iter().find(|n| n.node == id)
    }

    /// Recompute the hash and compare with the stored one.
    pub fn verify(&self) -> bool {
        self.compute_hash() == self.report_hash
    }

    fn compute_hash(&self) -> String {
        let mut unhashed = self.clone();
        unhashed.report_hash.clear();
        canonical_hash_hex(&unhashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EventDescriptor;
    use crate::types::{EventKind, Mapping};

    fn m(p: &str, h: &str) -> Mapping {
        Mapping::new(p, h)
    }

    /// Root with two alternative cospeciations, each down to two tips.
    fn two_way_input() -> ReconGraphInput {
        ReconGraphInput::new()
            .with_mapping(
                m("p0", "h0"),
                vec![
                    EventDescriptor::binary(EventKind::Cospeciation, m("p1", "h1"), m("p2", "h2")),
                    EventDescriptor::binary(EventKind::Cospeciation, m("p1", "h2"), m("p2", "h1")),
                ],
                2.0,
            )
            .with_mapping(m("p1", "h1"), vec![EventDescriptor::leaf_pair()], 0.0)
            .with_mapping(m("p2", "h2"), vec![EventDescriptor::leaf_pair()], 0.0)
            .with_mapping(m("p1", "h2"), vec![EventDescriptor::leaf_pair()], 0.0)
            .with_mapping(m("p2", "h1"), vec![EventDescriptor::leaf_pair()], 0.0)
    }

    #[test]
    fn test_build_counts_both_reconciliations() {
        let report = CountReport::build(&two_way_input(), &KernelConfig::default()).unwrap();

        assert_eq!(report.total_reconciliations, "2");
        assert_eq!(report.template_size, 3);
        assert_eq!(report.template_root, "(p0, h0)");
        assert_eq!(report.root_distribution.evaluate(0).to_string(), "1");
        assert_eq!(report.root_distribution.evaluate(2).to_string(), "1");
        assert!(report.verify());
    }

    #[test]
    fn test_report_is_deterministic() {
        let config = KernelConfig::default();
        let a = CountReport::build(&two_way_input(), &config).unwrap();
        let b = CountReport::build(&two_way_input(), &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.report_hash, b.report_hash);
    }

    #[test]
    fn test_supercounts_can_be_omitted() {
        let config = KernelConfig {
            include_supercounts: false,
            ..KernelConfig::default()
        };
        let report = CountReport::build(&two_way_input(), &config).unwrap();
        assert!(report.nodes.iter().all(|n| n.supercount.is_none()));

        let full = CountReport::build(&two_way_input(), &KernelConfig::default()).unwrap();
        assert!(full.nodes.iter().all(|n| n.supercount.is_some()));
        assert_ne!(report.params_hash, full.params_hash);
    }

    #[test]
    fn test_tampering_breaks_verification() {
        let mut report = CountReport::build(&two_way_input(), &KernelConfig::default()).unwrap();
        report.total_reconciliations = "3".to_string();
        assert!(!report.verify());
    }

    #[test]
    fn test_malformed_input_is_reported() {
        let input = ReconGraphInput::new().with_mapping(
            m("p0", "h0"),
            vec![EventDescriptor::loss(m("p9", "h9"))],
            0.0,
        );
        let err = CountReport::build(&input, &KernelConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Graph(MalformedGraphError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_report_serde() {
        let report = CountReport::build(&two_way_input(), &KernelConfig::default()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: CountReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert!(back.verify());
    }
}
