mod build;
mod expand;
mod model;
mod search;

use serde::Deserialize;

pub use build::build_graph;
pub use expand::{chunk, expand};
pub use model::{
    FEE_ID, GraphEdge, GraphGroup, GraphNode, GraphSummary, HUB_ID, HubFlow, INPUT_GROUP_ID,
    NodeRole, OUTPUT_GROUP_ID, TransactionGraph, dedup_edges, seed_from_txid,
};
pub use search::search_nodes;

/// Display-tuning thresholds for collapsing and chunking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Inputs or external outputs beyond this count collapse into one group.
    pub group_threshold: usize,
    /// Groups larger than this are chunked instead of flat-expanded.
    pub chunk_size: usize,
}

impl GroupingConfig {
    pub const DEFAULT_GROUP_THRESHOLD: usize = 6;
    pub const DEFAULT_CHUNK_SIZE: usize = 50;
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            group_threshold: Self::DEFAULT_GROUP_THRESHOLD,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}
