use std::collections::HashMap;

use tracing::debug;

use crate::tx::{TxInput, TxOutput, TxRecord};

use super::GroupingConfig;
use super::model::{
    FEE_ID, GraphEdge, GraphGroup, GraphNode, GraphSummary, HUB_ID, HubFlow, INPUT_GROUP_ID,
    NodeRole, OUTPUT_GROUP_ID, TransactionGraph, dedup_edges, seed_from_txid,
};

const OUTPOINT_TXID_CHARS: usize = 8;

pub fn build_graph(tx: &TxRecord, config: &GroupingConfig) -> TransactionGraph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut groups = HashMap::new();

    nodes.push(GraphNode::group(HUB_ID, tx.inputs.len() + tx.outputs.len()));

    let inputs = tx
        .inputs
        .iter()
        .enumerate()
        .map(|(position, input)| input_node(position, input))
        .collect::<Vec<_>>();
    attach_members(
        INPUT_GROUP_ID,
        inputs,
        HubFlow::IntoHub,
        config.group_threshold,
        &mut nodes,
        &mut edges,
        &mut groups,
    );

    let (change, external): (Vec<_>, Vec<_>) = tx
        .outputs
        .iter()
        .map(output_node)
        .partition(|node| node.role == NodeRole::Change);
    attach_members(
        OUTPUT_GROUP_ID,
        external,
        HubFlow::FromHub,
        config.group_threshold,
        &mut nodes,
        &mut edges,
        &mut groups,
    );
    for node in change {
        edges.push(HubFlow::FromHub.edge(&node.id));
        nodes.push(node);
    }

    if let Some(fee_sats) = tx.fee_sats {
        nodes.push(GraphNode {
            id: FEE_ID.to_owned(),
            role: NodeRole::Fee,
            value_sats: Some(fee_sats),
            address: None,
            is_mine: false,
            derivation_path: None,
            children: 0,
        });
        edges.push(HubFlow::FromHub.edge(FEE_ID));
    }

    dedup_edges(&mut edges);

    let graph = TransactionGraph {
        nodes,
        edges,
        groups,
        summary: GraphSummary {
            input_count: tx.inputs.len(),
            output_count: tx.outputs.len(),
            virtual_size: tx.virtual_size,
            fee_rate_sat_per_vb: tx.fee_rate_sat_per_vb,
            fee_sats: tx.fee_sats,
        },
        seed: seed_from_txid(&tx.txid),
    };

    debug!(
        txid = %tx.txid,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        groups = graph.groups.len(),
        "built transaction graph"
    );
    graph
}

fn attach_members(
    group_id: &str,
    members: Vec<GraphNode>,
    flow: HubFlow,
    threshold: usize,
    nodes: &mut Vec<GraphNode>,
    edges: &mut Vec<GraphEdge>,
    groups: &mut HashMap<String, GraphGroup>,
) {
    if members.len() > threshold {
        let member_edges = members
            .iter()
            .map(|member| flow.edge(&member.id))
            .collect::<Vec<_>>();
        nodes.push(GraphNode::group(group_id, members.len()));
        edges.push(flow.edge(group_id));
        groups.insert(
            group_id.to_owned(),
            GraphGroup {
                id: group_id.to_owned(),
                members,
                edges: member_edges,
            },
        );
        return;
    }

    for member in members {
        edges.push(flow.edge(&member.id));
        nodes.push(member);
    }
}

fn input_node(position: usize, input: &TxInput) -> GraphNode {
    let address = input.address.clone().or_else(|| outpoint_label(input));
    GraphNode {
        id: format!("input-{position}"),
        role: NodeRole::Input,
        value_sats: input.value_sats,
        address,
        is_mine: input.is_mine,
        derivation_path: input.derivation_path.clone(),
        children: 0,
    }
}

fn outpoint_label(input: &TxInput) -> Option<String> {
    if input.prev_txid.is_empty() {
        return None;
    }
    let short = input
        .prev_txid
        .chars()
        .take(OUTPOINT_TXID_CHARS)
        .collect::<String>();
    Some(format!("{short}:{}", input.prev_vout))
}

fn output_node(output: &TxOutput) -> GraphNode {
    let role = if output.address_type.is_change() {
        NodeRole::Change
    } else {
        NodeRole::Output
    };
    GraphNode {
        id: format!("output-{}", output.index),
        role,
        value_sats: Some(output.value_sats),
        address: output.address.clone(),
        is_mine: output.is_mine,
        derivation_path: output.derivation_path.clone(),
        children: 0,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::graph::testing::{assert_consistent, input, output, transaction};
    use crate::tx::{AddressType, TxRecord};

    use super::*;

    fn count_role(graph: &TransactionGraph, role: NodeRole) -> usize {
        graph.nodes.iter().filter(|node| node.role == role).count()
    }

    #[test]
    fn small_transaction_with_change_and_fee() {
        let tx = TxRecord {
            txid: "small".to_owned(),
            inputs: vec![
                input(Some(10_000), Some("bc1qa")),
                input(Some(20_000), Some("bc1qb")),
                input(Some(5_000), None),
            ],
            outputs: vec![
                output(0, 12_000, AddressType::Change),
                output(1, 20_000, AddressType::External),
            ],
            fee_sats: Some(3_000),
            fee_rate_sat_per_vb: Some(12.0),
            virtual_size: Some(250),
        };

        let graph = build_graph(&tx, &GroupingConfig::default());
        assert_consistent(&graph);

        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.edge_count(), 6);
        assert!(graph.groups.is_empty());
        assert_eq!(count_role(&graph, NodeRole::Input), 3);
        assert_eq!(count_role(&graph, NodeRole::Change), 1);
        assert_eq!(count_role(&graph, NodeRole::Output), 1);
        assert_eq!(count_role(&graph, NodeRole::Fee), 1);

        let into_hub = graph.edges.iter().filter(|edge| edge.to == HUB_ID).count();
        let from_hub = graph.edges.iter().filter(|edge| edge.from == HUB_ID).count();
        assert_eq!(into_hub, 3);
        assert_eq!(from_hub, 3);
        assert!(graph.edges.contains(&GraphEdge::new(HUB_ID, FEE_ID)));

        let hub = graph.hub().expect("hub");
        assert_eq!(hub.children, 5);
        assert_eq!(graph.summary.fee_sats, Some(3_000));
        assert_eq!(graph.summary.input_count, 3);
        assert_eq!(graph.summary.output_count, 2);
    }

    #[test]
    fn missing_input_address_falls_back_to_outpoint() {
        let tx = TxRecord {
            txid: "fallback".to_owned(),
            inputs: vec![input(None, None)],
            ..TxRecord::default()
        };
        let graph = build_graph(&tx, &GroupingConfig::default());
        let node = graph.node("input-0").expect("input node");
        assert_eq!(node.address.as_deref(), Some("c0ffee00:0"));
        assert!(node.address.as_deref().is_some_and(|address| !address.contains('…')));
        assert!(node.value_sats.is_none());
    }

    #[test]
    fn missing_outpoint_leaves_address_unknown() {
        let tx = TxRecord {
            txid: "bare".to_owned(),
            inputs: vec![crate::tx::TxInput::default()],
            ..TxRecord::default()
        };
        let graph = build_graph(&tx, &GroupingConfig::default());
        assert!(graph.node("input-0").expect("input").address.is_none());
    }

    #[rstest]
    #[case(0, 0, 0, false)]
    #[case(1, 1, 0, true)]
    #[case(6, 6, 1, true)]
    #[case(3, 2, 3, false)]
    #[case(6, 0, 6, true)]
    fn below_threshold_builds_no_groups(
        #[case] inputs: usize,
        #[case] external: usize,
        #[case] change: usize,
        #[case] with_fee: bool,
    ) {
        let fee = with_fee.then_some(500);
        let graph = build_graph(
            &transaction("flat", inputs, external, change, fee),
            &GroupingConfig::default(),
        );
        assert_consistent(&graph);
        assert!(graph.groups.is_empty());
        assert_eq!(count_role(&graph, NodeRole::Group), 1, "only the hub");
        assert_eq!(
            graph.node_count(),
            inputs + external + change + 1 + usize::from(with_fee)
        );
    }

    #[rstest]
    #[case(7)]
    #[case(50)]
    #[case(2_500)]
    fn many_inputs_collapse_into_one_group(#[case] inputs: usize) {
        let graph = build_graph(
            &transaction("wide", inputs, 2, 0, None),
            &GroupingConfig::default(),
        );
        assert_consistent(&graph);

        assert_eq!(count_role(&graph, NodeRole::Input), 0);
        let group = graph.group(INPUT_GROUP_ID).expect("input group");
        assert_eq!(group.members.len(), inputs);
        assert_eq!(graph.node(INPUT_GROUP_ID).expect("node").children, inputs);
        assert!(group.edges.iter().all(|edge| edge.to == HUB_ID));
        assert!(graph.edges.contains(&GraphEdge::new(INPUT_GROUP_ID, HUB_ID)));
    }

    #[test]
    fn hundred_twenty_inputs_scenario() {
        let graph = build_graph(
            &transaction("scenario", 120, 2, 0, None),
            &GroupingConfig::default(),
        );
        assert_consistent(&graph);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.node(INPUT_GROUP_ID).expect("group").children, 120);
        assert_eq!(count_role(&graph, NodeRole::Output), 2);
    }

    #[test]
    fn change_outputs_are_never_grouped() {
        let graph = build_graph(
            &transaction("change-heavy", 1, 8, 9, None),
            &GroupingConfig::default(),
        );
        assert_consistent(&graph);
        assert_eq!(count_role(&graph, NodeRole::Change), 9);
        let group = graph.group(OUTPUT_GROUP_ID).expect("external group");
        assert_eq!(group.members.len(), 8);
        assert!(group.members.iter().all(|node| node.role == NodeRole::Output));
        assert!(group.edges.iter().all(|edge| edge.from == HUB_ID));
        assert!(graph.edges.contains(&GraphEdge::new(HUB_ID, OUTPUT_GROUP_ID)));
    }

    #[test]
    fn threshold_is_configurable() {
        let config = GroupingConfig {
            group_threshold: 2,
            ..GroupingConfig::default()
        };
        let graph = build_graph(&transaction("tight", 3, 1, 0, None), &config);
        assert!(graph.groups.contains_key(INPUT_GROUP_ID));
        assert!(!graph.groups.contains_key(OUTPUT_GROUP_ID));
    }

    #[test]
    fn fee_node_only_when_fee_reported() {
        let without = build_graph(&transaction("nofee", 2, 1, 0, None), &GroupingConfig::default());
        assert!(without.node(FEE_ID).is_none());
        let with = build_graph(&transaction("fee", 2, 1, 0, Some(0)), &GroupingConfig::default());
        assert_eq!(with.node(FEE_ID).expect("fee").value_sats, Some(0));
    }

    #[test]
    fn same_txid_gives_same_seed() {
        let config = GroupingConfig::default();
        let first = build_graph(&transaction("repeatable", 2, 1, 0, None), &config);
        let second = build_graph(&transaction("repeatable", 9, 3, 1, None), &config);
        assert_eq!(first.seed, second.seed);
        assert_eq!(first.seed, seed_from_txid("repeatable"));
    }
}
