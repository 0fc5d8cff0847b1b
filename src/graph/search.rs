use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::model::{GraphNode, TransactionGraph};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn best_score(matcher: &SkimMatcherV2, node: &GraphNode, query: &str) -> Option<i64> {
    [
        Some(node.id.as_str()),
        node.address.as_deref(),
        node.derivation_path.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter_map(|text| fuzzy_match_score(matcher, text, query))
    .max()
}

/// Materialized node ids matching `query`, best match first.
pub fn search_nodes(graph: &TransactionGraph, query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut ranked = graph
        .nodes
        .iter()
        .filter_map(|node| best_score(&matcher, node, query).map(|score| (score, node.id.as_str())))
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked.into_iter().map(|(_, id)| id.to_owned()).collect()
}
