//! Integration tests for dating and branch-length derivation.
//!
//! These tests drive the full pipeline from JSON inputs: date each
//! reconciliation, resolve time travel through a resolver, project onto
//! the host tree and derive host branch lengths.

use std::collections::BTreeMap;

use cophylo_kernel::{
    branch_lengths, date, Adjacency, ChronologicalOrder, CycleResolver, DatedReconciliation,
    DatingOutcome, DatingPipeline, DatingStatus, KernelConfig, PipelineError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Host tree:
///
/// ```text
///        H0
///       /  \
///     H1    H2
///    /  \
///  H3    H4
/// ```
const HOST_JSON: &str = r#"{
    "H0": ["H1", "H2"],
    "H1": ["H3", "H4"],
    "H2": [null, null],
    "H3": [null, null],
    "H4": [null, null]
}"#;

/// Two reconciliations: the first dates cleanly, the second has a transfer
/// from P2 into H1 while H1 is already an ancestor of P2.
const RECONCILIATIONS_JSON: &str = r#"[
    {
        "P0": ["H0", "P1"],
        "H0": ["H1", "H2"],
        "H1": ["H3", "H4"],
        "P1": ["P2", "P3"],
        "P2": [null, null],
        "P3": [null, null],
        "H2": [null, null],
        "H3": [null, null],
        "H4": [null, null]
    },
    {
        "P0": ["H0", "P1"],
        "H0": ["H1", "H2"],
        "H1": ["P1", "H4"],
        "P1": ["P2", "H3"],
        "P2": ["H1"],
        "H2": [null, null],
        "H3": [null, null],
        "H4": [null, null]
    }
]"#;

fn host() -> Adjacency<String> {
    serde_json::from_str(HOST_JSON).unwrap()
}

fn reconciliations() -> Vec<Adjacency<String>> {
    serde_json::from_str(RECONCILIATIONS_JSON).unwrap()
}

/// Resolver that reroutes parasite links into H1 one host level down, onto
/// H1's first child.
struct RerouteTransfers {
    calls: usize,
}

impl CycleResolver<String> for RerouteTransfers {
    type Error = std::convert::Infallible;

    fn resolve(
        &mut self,
        host: &Adjacency<String>,
        reconciliation: &Adjacency<String>,
    ) -> Result<Adjacency<String>, Self::Error> {
        self.calls += 1;
        Ok(reconciliation
            .nodes()
            .map(|node| {
                let kids = reconciliation
                    .children(node)
                    .unwrap_or(&[])
                    .iter()
                    .map(|child| match child {
                        Some(c) if node.starts_with('P') && c.as_str() == "H1" => {
                            host.present_children(c).next().cloned()
                        }
                        other => other.clone(),
                    })
                    .collect();
                (node.clone(), kids)
            })
            .collect())
    }
}

/// Resolver that always fails.
struct Broken;

#[derive(Debug, thiserror::Error)]
#[error("resolver gave up")]
struct GaveUp;

impl CycleResolver<String> for Broken {
    type Error = GaveUp;

    fn resolve(
        &mut self,
        _host: &Adjacency<String>,
        _reconciliation: &Adjacency<String>,
    ) -> Result<Adjacency<String>, Self::Error> {
        Err(GaveUp)
    }
}

fn assert_parents_first(recon: &Adjacency<String>, result: &DatedReconciliation<String>) {
    let order = result.order.as_ref().unwrap();
    for (parent, child) in recon.edges() {
        assert!(
            order.rank(parent) < order.rank(child),
            "{} dated after its child {}",
            parent,
            child
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dater Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_path_example_from_json() {
    let tree: Adjacency<String> =
        serde_json::from_str(r#"{"A": ["B"], "B": ["C"], "C": [null]}"#).unwrap();

    let order = date(&tree).into_order().unwrap();
    let expected: ChronologicalOrder<String> = [("A", 0), ("B", 1), ("C", 2)]
        .into_iter()
        .map(|(k, r)| (k.to_string(), r))
        .collect();
    assert_eq!(order, expected);

    let lengths = branch_lengths(&tree, &order);
    let expected: BTreeMap<String, usize> = [("B".to_string(), 1), ("C".to_string(), 1)]
        .into_iter()
        .collect();
    assert_eq!(lengths, expected);
}

#[test]
fn test_host_tree_alone_is_dated() {
    let host = host();
    let order = date(&host).into_order().unwrap();

    assert_eq!(host.root(), Some(&"H0".to_string()));
    assert_eq!(order.rank(&"H0".to_string()), Some(0));
    assert_eq!(order.rank(&"H1".to_string()), Some(1));
    for leaf in host.leaves() {
        assert_eq!(order.rank(leaf), Some(2));
    }
}

#[test]
fn test_transfer_cycle_is_time_travel() {
    let recons = reconciliations();
    assert!(!date(&recons[0]).is_time_travel());
    assert_eq!(date(&recons[1]), DatingOutcome::TimeTravel);
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_pipeline_without_resolver() {
    let mut pipeline = DatingPipeline::without_resolver(KernelConfig::default());
    let results = pipeline.run(&host(), &reconciliations()).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, DatingStatus::Dated);
    assert_eq!(results[1].status, DatingStatus::Unresolved);
    assert_parents_first(&reconciliations()[0], &results[0]);
}

#[test]
fn test_pipeline_resolves_and_redates() {
    let mut pipeline = DatingPipeline::new(KernelConfig::default(), RerouteTransfers { calls: 0 });
    let results = pipeline.run(&host(), &reconciliations()).unwrap();

    assert!(results.iter().all(|r| r.is_dated()));
    assert_eq!(results[0].resolution_attempts, 0);
    assert_eq!(results[1].resolution_attempts, 1);
    assert_eq!(pipeline.into_resolver().unwrap().calls, 1);

    // Host lengths are always derived on the projected host order.
    for result in &results {
        let host_order = result.host_order.as_ref().unwrap();
        assert_eq!(host_order.rank(&"H0".to_string()), Some(0));
        assert_eq!(host_order.rank(&"H1".to_string()), Some(1));
        assert_eq!(result.branch_lengths["H1"], 1);
        assert_eq!(result.branch_lengths["H2"], 2);
        assert_eq!(result.branch_lengths["H3"], 1);
        assert!(result.branch_lengths.values().all(|&l| l > 0));
    }
}

#[test]
fn test_resolver_error_aborts_batch() {
    let mut pipeline = DatingPipeline::new(KernelConfig::default(), Broken);
    let err = pipeline.run(&host(), &reconciliations()).unwrap_err();

    let PipelineError::Resolution { index, .. } = err;
    assert_eq!(index, 1);
}

#[test]
fn test_zero_attempts_skips_resolver() {
    let config = KernelConfig::default().with_max_resolution_attempts(0);
    let mut pipeline = DatingPipeline::new(config, Broken);
    let results = pipeline.run(&host(), &reconciliations()).unwrap();

    assert_eq!(results[1].status, DatingStatus::Unresolved);
    assert_eq!(results[1].resolution_attempts, 0);
}

#[test]
fn test_results_serialize_for_rendering() {
    let mut pipeline = DatingPipeline::without_resolver(KernelConfig::default());
    let results = pipeline.run(&host(), &reconciliations()).unwrap();

    let json: serde_json::Value = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["status"], "dated");
    assert_eq!(json[1]["status"], "unresolved");
    assert_eq!(json[0]["branch_lengths"]["H4"], 1);
    assert!(json[1]["order"].is_null());
}
