//! Mapping keys and DTL event kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed mapping of one parasite-tree node onto one host-tree node.
///
/// `host == None` is the symbolic "no host" marker. Implements `Ord`
/// as (parasite, host) so map nodes iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mapping {
    /// Parasite (symbiont) tree node.
    pub parasite: String,
    /// Host tree node, or `None` for the no-host marker.
    pub host: Option<String>,
}

impl Mapping {
    /// Create a mapping onto a host node.
    pub fn new(parasite: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            parasite: parasite.into(),
            host: Some(host.into()),
        }
    }

    /// Create a mapping onto the no-host marker.
    pub fn unhosted(parasite: impl Into<String>) -> Self {
        Self {
            parasite: parasite.into(),
            host: None,
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "({}, {})", self.parasite, host),
            None => write!(f, "({}, -)", self.parasite),
        }
    }
}

/// Type of a DTL event node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Parasite and host speciate together.
    #[serde(rename = "S", alias = "cospeciation")]
    Cospeciation,
    /// A parasite leaf sits on its host leaf.
    #[serde(rename = "C", alias = "leaf_pair")]
    LeafPair,
    /// Parasite lineage jumps to another host edge.
    #[serde(rename = "T", alias = "transfer")]
    Transfer,
    /// Parasite lineage splits within one host.
    #[serde(rename = "D", alias = "duplication")]
    Duplication,
    /// Parasite lineage is lost along one host child.
    #[serde(rename = "L", alias = "loss")]
    Loss,
}

impl EventKind {
    /// Parse an event kind from its single-letter code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(Self::Cospeciation),
            "C" => Some(Self::LeafPair),
            "T" => Some(Self::Transfer),
            "D" => Some(Self::Duplication),
            "L" => Some(Self::Loss),
            _ => None,
        }
    }

    /// Single-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cospeciation => "S",
            Self::LeafPair => "C",
            Self::Transfer => "T",
            Self::Duplication => "D",
            Self::Loss => "L",
        }
    }

    /// Maximum number of present (non-sentinel) child mappings.
    pub fn max_children(&self) -> usize {
        match self {
            Self::Cospeciation | Self::Transfer | Self::Duplication => 2,
            Self::LeafPair | Self::Loss => 1,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
