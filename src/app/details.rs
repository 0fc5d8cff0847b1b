use eframe::egui::{RichText, Ui};

use txgraph::graph::GraphNode;
use txgraph::util::format_sats;

use super::TxGraphApp;

impl TxGraphApp {
    pub(super) fn draw_details(&mut self, ui: &mut Ui) {
        self.draw_summary(ui);
        ui.separator();

        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(node) = self.session.selected().cloned() else {
            ui.label("Tap a node to inspect it. Tap a group to expand it.");
            return;
        };

        ui.label(RichText::new(node.display_label()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);
        draw_node_fields(ui, &node);

        let matches = self
            .search_match_cache
            .as_ref()
            .map_or(0, |cache| cache.matches.len());
        if !self.search.trim().is_empty() {
            ui.separator();
            ui.label(format!("Search matches: {matches}"));
        }
    }

    fn draw_summary(&mut self, ui: &mut Ui) {
        ui.heading("Transaction");
        ui.add_space(6.0);

        let summary = self.session.graph().summary.clone();
        ui.label(format!("Inputs: {}", summary.input_count));
        ui.label(format!("Outputs: {}", summary.output_count));
        if let Some(virtual_size) = summary.virtual_size {
            ui.label(format!("Virtual size: {virtual_size} vB"));
        }
        match (summary.fee_sats, summary.fee_rate_sat_per_vb) {
            (Some(fee), Some(rate)) => {
                ui.label(format!("Fee: {} ({rate:.1} sat/vB)", format_sats(fee)));
            }
            (Some(fee), None) => {
                ui.label(format!("Fee: {}", format_sats(fee)));
            }
            (None, _) => {
                ui.label("Fee: unknown");
            }
        }

        let collapsed = self
            .session
            .graph()
            .nodes
            .iter()
            .filter(|node| self.session.graph().is_collapsed(&node.id))
            .map(|node| (node.id.clone(), node.children))
            .collect::<Vec<_>>();
        if collapsed.is_empty() {
            return;
        }

        ui.add_space(6.0);
        ui.label(RichText::new("Collapsed groups").strong());
        for (id, children) in collapsed {
            if ui.link(format!("{id} ({children})")).on_hover_text("Expand").clicked() {
                self.session.expand_group(&id);
            }
        }
    }
}

fn draw_node_fields(ui: &mut Ui, node: &GraphNode) {
    let role = if node.is_hub() { "transaction" } else { node.role.label() };
    ui.label(format!("Role: {role}"));
    if let Some(value) = node.value_sats {
        ui.label(format!("Value: {}", format_sats(value)));
    }
    if let Some(address) = &node.address {
        ui.label(format!("Address: {address}"));
    }
    if let Some(path) = &node.derivation_path {
        ui.label(format!("Derivation path: {path}"));
    }
    if node.is_mine {
        ui.label("Owned by this wallet");
    }
    if node.children > 0 {
        ui.label(format!("Members: {}", node.children));
    }
}
