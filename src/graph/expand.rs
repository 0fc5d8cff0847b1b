use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use super::GroupingConfig;
use super::model::{GraphGroup, GraphNode, HubFlow, TransactionGraph, dedup_edges};

/// Materializes the members of `group_id`, or chunks the group when it is
/// larger than `config.chunk_size`.
///
/// Unknown ids and ids that are not collapsed groups return the same `Arc`.
pub fn expand(
    graph: &Arc<TransactionGraph>,
    group_id: &str,
    config: &GroupingConfig,
) -> Arc<TransactionGraph> {
    let Some(group) = graph.group(group_id) else {
        trace!(group_id, "expand ignored, no such group");
        return Arc::clone(graph);
    };
    if !graph.is_collapsed(group_id) {
        trace!(group_id, "expand ignored, group is not materialized");
        return Arc::clone(graph);
    }

    if group.members.len() > config.chunk_size.max(1) {
        return chunk(graph, group_id, config.chunk_size);
    }

    let mut next = TransactionGraph::clone(graph);
    let Some(group) = next.groups.remove(group_id) else {
        return Arc::clone(graph);
    };

    next.nodes.retain(|node| node.id != group_id);
    next.edges.retain(|edge| !edge.touches(group_id));
    let member_count = group.members.len();
    next.nodes.extend(group.members);
    next.edges.extend(group.edges);
    drop_dangling_edges(&mut next);
    dedup_edges(&mut next.edges);

    debug!(group_id, members = member_count, "expanded group");
    Arc::new(next)
}

/// Splits `group_id` into consecutive sub-groups of at most `chunk_size` members.
pub fn chunk(
    graph: &Arc<TransactionGraph>,
    group_id: &str,
    chunk_size: usize,
) -> Arc<TransactionGraph> {
    if !graph.is_collapsed(group_id) {
        trace!(group_id, "chunk ignored, no such group");
        return Arc::clone(graph);
    }

    let mut next = TransactionGraph::clone(graph);
    let Some(group) = next.groups.remove(group_id) else {
        return Arc::clone(graph);
    };

    let flow = group
        .edges
        .first()
        .map(HubFlow::of_edge)
        .or_else(|| {
            graph
                .edges
                .iter()
                .find(|edge| edge.touches(group_id))
                .map(HubFlow::of_edge)
        })
        .unwrap_or(HubFlow::IntoHub);

    next.nodes.retain(|node| node.id != group_id);
    next.edges.retain(|edge| !edge.touches(group_id));

    let chunk_size = chunk_size.max(1);
    let mut chunk_count = 0usize;
    for (index, slice) in group.members.chunks(chunk_size).enumerate() {
        let chunk_id = format!("{group_id}-chunk-{index}");
        let member_ids = slice
            .iter()
            .map(|member| member.id.as_str())
            .collect::<HashSet<_>>();
        let mut edges = group
            .edges
            .iter()
            .filter(|edge| {
                member_ids.contains(edge.from.as_str()) || member_ids.contains(edge.to.as_str())
            })
            .cloned()
            .collect::<Vec<_>>();
        dedup_edges(&mut edges);

        next.nodes.push(GraphNode::group(chunk_id.clone(), slice.len()));
        next.edges.push(flow.edge(&chunk_id));
        next.groups.insert(
            chunk_id.clone(),
            GraphGroup {
                id: chunk_id,
                members: slice.to_vec(),
                edges,
            },
        );
        chunk_count += 1;
    }
    dedup_edges(&mut next.edges);

    debug!(
        group_id,
        members = group.members.len(),
        chunks = chunk_count,
        chunk_size,
        "chunked group"
    );
    Arc::new(next)
}

fn drop_dangling_edges(graph: &mut TransactionGraph) {
    let ids = graph
        .nodes
        .iter()
        .map(|node| node.id.clone())
        .collect::<HashSet<_>>();
    graph
        .edges
        .retain(|edge| ids.contains(&edge.from) && ids.contains(&edge.to));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::graph::testing::{assert_consistent, transaction};
    use crate::graph::{
        GraphEdge, HUB_ID, INPUT_GROUP_ID, NodeRole, OUTPUT_GROUP_ID, build_graph,
    };

    use super::*;

    fn built(inputs: usize, external: usize) -> Arc<TransactionGraph> {
        Arc::new(build_graph(
            &transaction("expand", inputs, external, 1, Some(100)),
            &GroupingConfig::default(),
        ))
    }

    fn chunk_ids(graph: &TransactionGraph, prefix: &str) -> Vec<String> {
        let mut ids = graph
            .groups
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[test]
    fn small_group_expands_flat() {
        let graph = built(12, 2);
        let expanded = expand(&graph, INPUT_GROUP_ID, &GroupingConfig::default());
        assert_consistent(&expanded);

        assert!(expanded.group(INPUT_GROUP_ID).is_none());
        assert!(expanded.node(INPUT_GROUP_ID).is_none());
        let inputs = expanded
            .nodes
            .iter()
            .filter(|node| node.role == NodeRole::Input)
            .count();
        assert_eq!(inputs, 12);
        for index in 0..12 {
            assert!(
                expanded
                    .edges
                    .contains(&GraphEdge::new(format!("input-{index}"), HUB_ID))
            );
        }
        assert!(!expanded.edges.iter().any(|edge| edge.touches(INPUT_GROUP_ID)));
    }

    #[test]
    fn expanding_an_expanded_id_is_a_no_op() {
        let graph = built(12, 2);
        let config = GroupingConfig::default();
        let expanded = expand(&graph, INPUT_GROUP_ID, &config);
        let again = expand(&expanded, INPUT_GROUP_ID, &config);
        assert!(Arc::ptr_eq(&expanded, &again));
    }

    #[rstest]
    #[case("does-not-exist")]
    #[case(HUB_ID)]
    #[case("input-0")]
    fn unknown_or_plain_ids_are_ignored(#[case] id: &str) {
        let graph = built(3, 1);
        let config = GroupingConfig::default();
        assert!(Arc::ptr_eq(&graph, &expand(&graph, id, &config)));
        assert!(Arc::ptr_eq(&graph, &chunk(&graph, id, 50)));
    }

    #[test]
    fn hundred_twenty_inputs_expand_into_three_chunks() {
        let graph = Arc::new(build_graph(
            &transaction("scenario", 120, 2, 0, None),
            &GroupingConfig::default(),
        ));
        let expanded = expand(&graph, INPUT_GROUP_ID, &GroupingConfig::default());
        assert_consistent(&expanded);

        let ids = chunk_ids(&expanded, "inputs-chunk-");
        assert_eq!(
            ids,
            vec!["inputs-chunk-0", "inputs-chunk-1", "inputs-chunk-2"]
        );
        let sizes = ids
            .iter()
            .map(|id| expanded.node(id).expect("chunk node").children)
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert!(expanded.group(INPUT_GROUP_ID).is_none());
        for id in &ids {
            assert!(expanded.edges.contains(&GraphEdge::new(id.clone(), HUB_ID)));
        }
    }

    #[rstest]
    #[case(51)]
    #[case(100)]
    #[case(101)]
    #[case(1_234)]
    fn chunking_preserves_every_member_once(#[case] members: usize) {
        let graph = Arc::new(build_graph(
            &transaction("chunks", 2, members, 0, None),
            &GroupingConfig::default(),
        ));
        let chunked = chunk(&graph, OUTPUT_GROUP_ID, 50);
        assert_consistent(&chunked);

        let ids = chunk_ids(&chunked, "outputs-chunk-");
        assert_eq!(ids.len(), members.div_ceil(50));

        let mut seen = HashSet::new();
        let mut total = 0;
        for id in &ids {
            let group = chunked.group(id).expect("chunk group");
            total += group.members.len();
            assert!(group.members.len() <= 50);
            for member in &group.members {
                assert!(seen.insert(member.id.clone()), "duplicate {}", member.id);
            }
            assert_eq!(group.edges.len(), group.members.len());
            assert!(group.edges.iter().all(|edge| edge.from == HUB_ID));
            assert!(chunked.edges.contains(&GraphEdge::new(HUB_ID, id.clone())));
            assert!(!chunked.edges.contains(&GraphEdge::new(id.clone(), HUB_ID)));
        }
        assert_eq!(total, members);
    }

    #[test]
    fn chunk_direction_falls_back_to_top_level_edges() {
        let mut graph = build_graph(
            &transaction("no-edges", 1, 80, 0, None),
            &GroupingConfig::default(),
        );
        if let Some(group) = graph.groups.get_mut(OUTPUT_GROUP_ID) {
            group.edges.clear();
        }
        let chunked = chunk(&Arc::new(graph), OUTPUT_GROUP_ID, 50);
        assert!(
            chunked
                .edges
                .contains(&GraphEdge::new(HUB_ID, "outputs-chunk-0"))
        );
        assert!(
            chunked
                .edges
                .contains(&GraphEdge::new(HUB_ID, "outputs-chunk-1"))
        );
    }

    #[test]
    fn chunks_expand_recursively_down_to_members() {
        let config = GroupingConfig::default();
        let mut graph = Arc::new(build_graph(
            &transaction("recursive", 120, 1, 0, None),
            &config,
        ));
        graph = expand(&graph, INPUT_GROUP_ID, &config);
        for index in 0..3 {
            graph = expand(&graph, &format!("inputs-chunk-{index}"), &config);
            assert_consistent(&graph);
        }

        assert!(graph.groups.is_empty());
        let inputs = graph
            .nodes
            .iter()
            .filter(|node| node.role == NodeRole::Input)
            .count();
        assert_eq!(inputs, 120);
        assert_eq!(
            graph.edges.iter().filter(|edge| edge.to == HUB_ID).count(),
            120
        );
    }

    #[test]
    fn oversized_chunk_size_config_is_respected() {
        let config = GroupingConfig {
            group_threshold: 6,
            chunk_size: 10,
        };
        let graph = Arc::new(build_graph(&transaction("ten", 25, 1, 0, None), &config));
        let expanded = expand(&graph, INPUT_GROUP_ID, &config);
        assert_consistent(&expanded);
        assert_eq!(chunk_ids(&expanded, "inputs-chunk-").len(), 3);
    }
}
