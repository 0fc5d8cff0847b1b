use std::collections::{HashMap, HashSet};

pub const HUB_ID: &str = "tx-hub";
pub const INPUT_GROUP_ID: &str = "inputs";
pub const OUTPUT_GROUP_ID: &str = "outputs";
pub const FEE_ID: &str = "fee";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Input,
    Output,
    Change,
    Fee,
    Group,
}

impl NodeRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Change => "change",
            Self::Fee => "fee",
            Self::Group => "group",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub role: NodeRole,
    pub value_sats: Option<u64>,
    pub address: Option<String>,
    pub is_mine: bool,
    pub derivation_path: Option<String>,
    pub children: usize,
}

impl GraphNode {
    pub(crate) fn group(id: impl Into<String>, children: usize) -> Self {
        Self {
            id: id.into(),
            role: NodeRole::Group,
            value_sats: None,
            address: None,
            is_mine: false,
            derivation_path: None,
            children,
        }
    }

    pub fn is_hub(&self) -> bool {
        self.id == HUB_ID
    }

    /// Text shown next to the node; falls back to the id when no address is known.
    pub fn display_label(&self) -> &str {
        self.address.as_deref().unwrap_or(self.id.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

/// Which way a member's edge points relative to the hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HubFlow {
    IntoHub,
    FromHub,
}

impl HubFlow {
    pub fn edge(self, member_id: &str) -> GraphEdge {
        match self {
            Self::IntoHub => GraphEdge::new(member_id, HUB_ID),
            Self::FromHub => GraphEdge::new(HUB_ID, member_id),
        }
    }

    pub fn of_edge(edge: &GraphEdge) -> Self {
        if edge.from == HUB_ID {
            Self::FromHub
        } else {
            Self::IntoHub
        }
    }
}

/// A collapsed set of nodes standing behind one Group-role node.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphGroup {
    pub id: String,
    pub members: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSummary {
    pub input_count: usize,
    pub output_count: usize,
    pub virtual_size: Option<u64>,
    pub fee_rate_sat_per_vb: Option<f64>,
    pub fee_sats: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub groups: HashMap<String, GraphGroup>,
    pub summary: GraphSummary,
    pub seed: u64,
}

impl TransactionGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn group(&self, id: &str) -> Option<&GraphGroup> {
        self.groups.get(id)
    }

    /// True when `id` is a materialized Group node with members behind it.
    pub fn is_collapsed(&self, id: &str) -> bool {
        self.groups.contains_key(id)
            && self
                .node(id)
                .is_some_and(|node| node.role == NodeRole::Group && !node.is_hub())
    }

    pub fn hub(&self) -> Option<&GraphNode> {
        self.node(HUB_ID)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Removes repeated edges in place, keeping the first occurrence.
pub fn dedup_edges(edges: &mut Vec<GraphEdge>) {
    let mut seen = HashSet::with_capacity(edges.len());
    edges.retain(|edge| seen.insert((edge.from.clone(), edge.to.clone())));
}

/// Base-31 polynomial hash of the txid, masked to stay non-negative as an `i64`.
pub fn seed_from_txid(txid: &str) -> u64 {
    let hash = txid.chars().fold(0u64, |acc, ch| {
        acc.wrapping_mul(31).wrapping_add(u64::from(ch))
    });
    hash & (i64::MAX as u64)
}
