//! Batch dating of extracted reconciliations.
//!
//! Reconciliations are processed one at a time, in the order they were
//! extracted. A reconciliation that cannot be dated is handed to a
//! [`CycleResolver`] and re-dated, at most `max_resolution_attempts` times.
//! Each dated reconciliation is then projected onto the host tree, and host
//! branch lengths are derived from the projected order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::config::KernelConfig;
use crate::dating::{branch_lengths, date, project_order, DatingOutcome};
use crate::types::{Adjacency, ChronologicalOrder};

/// Revises a reconciliation whose dating produced a cycle.
///
/// Implementations usually reroute one or more transfer events so the
/// implied ordering becomes acyclic.
pub trait CycleResolver<K> {
    /// Error type of the resolver.
    type Error: std::error::Error + 'static;

    /// Produce a revised reconciliation.
    fn resolve(
        &mut self,
        host: &Adjacency<K>,
        reconciliation: &Adjacency<K>,
    ) -> Result<Adjacency<K>, Self::Error>;
}

/// Resolver placeholder for pipelines that only report time travel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl<K: Clone> CycleResolver<K> for NoResolver {
    type Error = Infallible;

    fn resolve(
        &mut self,
        _host: &Adjacency<K>,
        reconciliation: &Adjacency<K>,
    ) -> Result<Adjacency<K>, Self::Error> {
        Ok(reconciliation.clone())
    }
}

/// Error type for the dating pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError<E: std::error::Error + 'static> {
    /// The resolver failed.
    #[error("Cycle resolution failed for reconciliation {index}: {source}")]
    Resolution {
        /// Position of the reconciliation in the batch.
        index: usize,
        /// Resolver error.
        #[source]
        source: E,
    },
}

/// Final state of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatingStatus {
    /// A chronological order was found.
    Dated,
    /// Still time-travelling after all allowed resolution attempts.
    Unresolved,
}

/// Dating result for one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize",
    deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct DatedReconciliation<K> {
    /// Position in the batch.
    pub index: usize,
    /// Outcome.
    pub status: DatingStatus,
    /// Resolver calls made for this reconciliation.
    pub resolution_attempts: usize,
    /// Full chronological order.
    pub order: Option<ChronologicalOrder<K>>,
    /// Order restricted to host nodes.
    pub host_order: Option<ChronologicalOrder<K>>,
    /// Host branch lengths, keyed by child node.
    pub branch_lengths: BTreeMap<K, usize>,
}

impl<K> DatedReconciliation<K> {
    /// True if dated.
    pub fn is_dated(&self) -> bool {
        self.status == DatingStatus::Dated
    }
}

/// Sequential dating driver.
pub struct DatingPipeline<R> {
    config: KernelConfig,
    resolver: Option<R>,
}

impl DatingPipeline<NoResolver> {
    /// Pipeline that reports time travel without trying to resolve it.
    pub fn without_resolver(config: KernelConfig) -> Self {
        Self {
            config,
            resolver: None,
        }
    }
}

impl<R> DatingPipeline<R> {
    /// Pipeline with a cycle resolver.
    pub fn new(config: KernelConfig, resolver: R) -> Self {
        Self {
            config,
            resolver: Some(resolver),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Give back the resolver.
    pub fn into_resolver(self) -> Option<R> {
        self.resolver
    }

    /// Date every reconciliation in order.
    ///
    /// Returns one entry per input, in input order. A resolver error aborts
    /// the batch.
    pub fn run<K>(
        &mut self,
        host: &Adjacency<K>,
        reconciliations: &[Adjacency<K>],
    ) -> Result<Vec<DatedReconciliation<K>>, PipelineError<<R as CycleResolver<K>>::Error>>
    where
        K: Ord + Clone,
        R: CycleResolver<K>,
    {
        let mut results = Vec::with_capacity(reconciliations.len());

        for (index, reconciliation) in reconciliations.iter().enumerate() {
            results.push(self.date_one(index, host, reconciliation)?);
        }

        let dated = results.iter().filter(|r| r.is_dated()).count();
        tracing::info!(
            total = results.len(),
            dated,
            unresolved = results.len() - dated,
            "reconciliation batch dated"
        );

        Ok(results)
    }

    fn date_one<K>(
        &mut self,
        index: usize,
        host: &Adjacency<K>,
        reconciliation: &Adjacency<K>,
    ) -> Result<DatedReconciliation<K>, PipelineError<<R as CycleResolver<K>>::Error>>
    where
        K: Ord + Clone,
        R: CycleResolver<K>,
    {
        let mut outcome = date(reconciliation);
        let mut revised: Option<Adjacency<K>> = None;
        let mut attempts = 0;

        while outcome.is_time_travel() && attempts < self.config.max_resolution_attempts {
            let Some(resolver) = self.resolver.as_mut() else {
                break;
            };
            attempts += 1;
            tracing::warn!(index, attempt = attempts, "resolving time travel");

            let current = revised.as_ref().unwrap_or(reconciliation);
            let next = resolver
                .resolve(host, current)
                .map_err(|source| PipelineError::Resolution { index, source })?;
            outcome = date(&next);
            revised = Some(next);
        }

        let result = match outcome {
            DatingOutcome::Ordered(order) => {
                let host_order = project_order(host, &order);
                let lengths = branch_lengths(host, &host_order);
                DatedReconciliation {
                    index,
                    status: DatingStatus::Dated,
                    resolution_attempts: attempts,
                    order: Some(order),
                    host_order: Some(host_order),
                    branch_lengths: lengths,
                }
            }
            DatingOutcome::TimeTravel => {
                tracing::warn!(index, attempts, "reconciliation left unresolved");
                DatedReconciliation {
                    index,
                    status: DatingStatus::Unresolved,
                    resolution_attempts: attempts,
                    order: None,
                    host_order: None,
                    branch_lengths: BTreeMap::new(),
                }
            }
        };

        Ok(result)
    }
}
