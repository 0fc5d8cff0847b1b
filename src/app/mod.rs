use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout};
use tracing::debug;

use txgraph::graph::TransactionGraph;
use txgraph::interaction::InteractionEvent;
use txgraph::layout::VisibilityLease;
use txgraph::session::GraphSession;
use txgraph::util::short_label;

mod details;
mod render_utils;
mod view;

pub struct TxGraphApp {
    txid: String,
    session: GraphSession,
    lease: Option<VisibilityLease>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    drag: view::DragGesture,
}

struct SearchMatchCache {
    query: String,
    graph: Arc<TransactionGraph>,
    matches: Arc<HashSet<String>>,
}

impl TxGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, session: GraphSession, txid: String) -> Self {
        let lease = Some(session.acquire_lease());
        Self {
            txid,
            session,
            lease,
            search: String::new(),
            search_match_cache: None,
            drag: view::DragGesture::default(),
        }
    }

    /// Holds the visibility lease only while the window is actually shown.
    fn sync_visibility(&mut self, ctx: &Context) {
        let minimized = ctx.input(|input| input.viewport().minimized.unwrap_or(false));
        if minimized && self.lease.is_some() {
            debug!("window minimized, layout paused");
            self.lease = None;
        } else if !minimized && self.lease.is_none() {
            debug!("window restored, layout resumed");
            self.lease = Some(self.session.acquire_lease());
        }
    }

    fn search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == query
            && Arc::ptr_eq(&cached.graph, self.session.graph())
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matches = Arc::new(self.session.search(query).into_iter().collect::<HashSet<_>>());
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph: Arc::clone(self.session.graph()),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn log_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                InteractionEvent::SelectionChanged(id) => debug!(?id, "selection changed"),
                InteractionEvent::ExpandRequested(id) => debug!(%id, "expand applied"),
            }
        }
    }
}

impl eframe::App for TxGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.sync_visibility(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("txgraph");
                    ui.separator();
                    ui.label(format!("tx: {}", short_label(&self.txid, 8)))
                        .on_hover_text(self.txid.as_str());
                    ui.label(format!("nodes: {}", self.session.graph().node_count()));
                    ui.label(format!("edges: {}", self.session.graph().edge_count()));
                    ui.separator();
                    ui.label("Search");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.search)
                            .hint_text("address, id or path")
                            .desired_width(220.0),
                    );
                    if ui.button("Reset layout").clicked() {
                        self.session.reset_layout();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let status = if self.session.is_awake() {
                            "settling"
                        } else if self.session.is_visible() {
                            "at rest"
                        } else {
                            "paused"
                        };
                        ui.label(status);
                    });
                });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));

        self.log_events();
    }
}
