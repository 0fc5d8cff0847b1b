//! Owns the current graph together with its layout engine and interaction
//! state, and rebuilds the engine whenever the graph or the canvas changes.

use std::sync::Arc;

use eframe::egui::Pos2;
use tracing::{debug, info};

use crate::config::Config;
use crate::graph::{
    GraphEdge, GraphNode, GroupingConfig, TransactionGraph, build_graph, expand, search_nodes,
};
use crate::interaction::{InteractionController, InteractionEvent};
use crate::layout::{CanvasSize, LayoutConfig, LayoutEngine, LayoutSnapshot, Visibility, VisibilityLease};
use crate::tx::TxRecord;

pub struct GraphSession {
    graph: Arc<TransactionGraph>,
    grouping: GroupingConfig,
    layout: LayoutConfig,
    canvas: CanvasSize,
    visibility: Visibility,
    engine: LayoutEngine,
    controller: InteractionController,
    events: Vec<InteractionEvent>,
    disposed: bool,
}

impl GraphSession {
    /// Starts with a zero canvas; nothing is simulated until [`Self::set_canvas`].
    pub fn new(graph: Arc<TransactionGraph>, grouping: GroupingConfig, layout: LayoutConfig) -> Self {
        let canvas = CanvasSize::default();
        let visibility = Visibility::new();
        let engine = LayoutEngine::new(Arc::clone(&graph), canvas, layout, visibility.clone());
        Self {
            graph,
            grouping,
            layout,
            canvas,
            visibility,
            engine,
            controller: InteractionController::new(),
            events: Vec::new(),
            disposed: false,
        }
    }

    pub fn from_transaction(tx: &TxRecord, config: &Config) -> Self {
        let graph = build_graph(tx, &config.grouping);
        info!(
            txid = %tx.txid,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            groups = graph.groups.len(),
            "transaction graph ready"
        );
        Self::new(Arc::new(graph), config.grouping, config.layout)
    }

    pub fn graph(&self) -> &Arc<TransactionGraph> {
        &self.graph
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> &LayoutSnapshot {
        self.engine.snapshot()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        self.engine.edges()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Replaces the graph. Returns `false` when `graph` is the current one.
    pub fn set_graph(&mut self, graph: Arc<TransactionGraph>) -> bool {
        if Arc::ptr_eq(&self.graph, &graph) {
            return false;
        }
        self.graph = graph;
        self.rebuild();
        true
    }

    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        if canvas == self.canvas {
            return;
        }
        self.canvas = canvas;
        self.rebuild();
    }

    /// Throws away the simulation and scatters the current graph again.
    pub fn reset_layout(&mut self) {
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.engine.teardown();
        if !self.disposed {
            self.engine = LayoutEngine::new(
                Arc::clone(&self.graph),
                self.canvas,
                self.layout,
                self.visibility.clone(),
            );
        }
        if let Some(event) = self.controller.reconcile(&self.graph) {
            self.events.push(event);
        }
    }

    /// Stops the simulation for good. Later rebuilds leave the layout empty.
    pub fn dispose(&mut self) {
        if !self.disposed {
            debug!("graph session disposed");
        }
        self.disposed = true;
        self.engine.teardown();
        self.controller.reconcile(&self.graph);
    }

    pub fn acquire_lease(&self) -> VisibilityLease {
        self.visibility.acquire()
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    pub fn advance(&mut self, elapsed_secs: f32) -> bool {
        self.engine.advance(elapsed_secs)
    }

    pub fn step(&mut self) -> bool {
        self.engine.step()
    }

    pub fn is_awake(&self) -> bool {
        self.engine.is_running() && self.engine.is_awake()
    }

    pub fn tap(&mut self, point: Pos2) {
        let event = self.controller.tap(&self.engine, point);
        self.handle(event);
    }

    pub fn drag_start(&mut self, point: Pos2) {
        if let Some(event) = self.controller.drag_start(&mut self.engine, point) {
            self.handle(event);
        }
    }

    pub fn drag_move(&mut self, point: Pos2) {
        if let Some(event) = self.controller.drag_move(&mut self.engine, point) {
            self.handle(event);
        }
    }

    pub fn drag_end(&mut self) {
        self.controller.drag_end(&mut self.engine);
    }

    pub fn drag_cancel(&mut self) {
        self.controller.drag_cancel(&mut self.engine);
    }

    fn handle(&mut self, event: InteractionEvent) {
        let expand_id = match &event {
            InteractionEvent::ExpandRequested(id) => Some(id.clone()),
            InteractionEvent::SelectionChanged(_) => None,
        };
        self.events.push(event);
        if let Some(group_id) = expand_id {
            self.expand_group(&group_id);
        }
    }

    /// Applies an expand request. Unknown or already expanded ids change nothing.
    pub fn expand_group(&mut self, group_id: &str) -> bool {
        let expanded = expand(&self.graph, group_id, &self.grouping);
        let changed = self.set_graph(expanded);
        if changed {
            info!(
                group_id,
                nodes = self.graph.node_count(),
                edges = self.graph.edge_count(),
                "group expanded"
            );
        }
        changed
    }

    /// Events emitted since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.controller.selected()
    }

    pub fn selected(&self) -> Option<&GraphNode> {
        self.selected_id().and_then(|id| self.graph.node(id))
    }

    pub fn search(&self, query: &str) -> Vec<String> {
        search_nodes(&self.graph, query)
    }
}
