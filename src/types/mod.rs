//! Core value types for the reconciliation kernel.

pub mod mapping;
pub mod distance;
pub mod adjacency;
pub mod order;

pub use mapping::{Mapping, EventKind};
pub use distance::{DistanceFunction, kronicker};
pub use adjacency::Adjacency;
pub use order::ChronologicalOrder;
