//! # cophylo-kernel
//!
//! Reconciliation-space diagnostics for host/parasite cophylogeny.
//!
//! Given the DAG of every maximum-parsimony DTL reconciliation, the kernel
//! answers two questions:
//!
//! > How far is the space of optimal reconciliations from any one of them?
//!
//! > Can a single reconciliation be placed on a consistent timeline?
//!
//! ## Core Contract
//!
//! 1. Build a [`ReconGraph`] from a [`ReconGraphInput`] (fail fast on malformed input)
//! 2. Sample a [`Template`] reconciliation with a fixed seed
//! 3. Count, for every node, how reconciliations through it are distributed
//!    by event-set distance from the template ([`CountingEngine`])
//! 4. Date resolved reconciliations by topological sort, reporting
//!    [`DatingOutcome::TimeTravel`] when no order exists
//! 5. Derive relative host branch lengths from the dated order
//!
//! ## Architecture
//!
//! ```text
//! ReconGraphInput → ReconGraph → Template → CountingEngine → CountReport
//!
//! Adjacency → date → ChronologicalOrder → project_order → branch_lengths
//!                ↑
//!          CycleResolver (DatingPipeline)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same graph input + same config → identical `report_hash`
//! - Template sampling is seeded; seed 0 by default
//! - Dating breaks ties between simultaneously ready nodes by node order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod config;
pub mod counting;
pub mod dating;
pub mod graph;
pub mod pipeline;
pub mod report;
pub mod template;
pub mod types;

// Re-exports
pub use types::{kronicker, Adjacency, ChronologicalOrder, DistanceFunction, EventKind, Mapping};
pub use graph::{
    EventDescriptor, MalformedGraphError, MappingEntry, Node, NodeId, NodeKind, Postorder,
    ReconGraph, ReconGraphInput,
};
pub use template::{sample_template, Template};
pub use counting::{count, CountTables, CountingEngine, CountingError, NodeTable};
pub use dating::{branch_lengths, date, project_order, DatingOutcome};
pub use pipeline::{
    CycleResolver, DatedReconciliation, DatingPipeline, DatingStatus, NoResolver, PipelineError,
};
pub use report::{CountReport, NodeCounts, ReportError};
pub use config::{ConfigError, KernelConfig};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Schema version for all serialized kernel types.
/// Increment on breaking changes to any schema type.
pub const COPHYLO_KERNEL_SCHEMA_VERSION: &str = "1.0.0";

/// Default config version identifier.
pub const DEFAULT_CONFIG_VERSION: &str = "kernel_config_v1";
