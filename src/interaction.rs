//! Pointer gestures on top of a [`LayoutEngine`]: hit-testing, selection,
//! expand requests and the temporary pointer constraint used while dragging.

use eframe::egui::Pos2;
use tracing::{debug, trace};

use crate::graph::TransactionGraph;
use crate::layout::{LayoutEngine, LayoutSnapshot, NodeLayout};
use crate::physics::ConstraintHandle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    SelectionChanged(Option<String>),
    ExpandRequested(String),
}

enum HitTarget {
    Group(String),
    Node(String),
}

struct ActiveDrag {
    node_id: String,
    constraint: ConstraintHandle,
}

/// Topmost node whose padded circle contains `point`. Later nodes win.
pub fn hit_test(snapshot: &LayoutSnapshot, point: Pos2, padding: f32) -> Option<&NodeLayout> {
    snapshot
        .iter()
        .rev()
        .find(|node| node.center.distance(point) <= node.radius + padding)
}

#[derive(Default)]
pub struct InteractionController {
    selected: Option<String>,
    drag: Option<ActiveDrag>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn dragged_node(&self) -> Option<&str> {
        self.drag.as_ref().map(|drag| drag.node_id.as_str())
    }

    fn resolve(engine: &LayoutEngine, point: Pos2) -> Option<HitTarget> {
        let padding = engine.config().hit_padding_dp * engine.canvas().scale();
        let hit = hit_test(engine.snapshot(), point, padding)?;
        if engine.graph().is_collapsed(&hit.id) {
            Some(HitTarget::Group(hit.id.clone()))
        } else {
            Some(HitTarget::Node(hit.id.clone()))
        }
    }

    fn select(&mut self, id: Option<String>) -> InteractionEvent {
        self.selected.clone_from(&id);
        InteractionEvent::SelectionChanged(id)
    }

    pub fn tap(&mut self, engine: &LayoutEngine, point: Pos2) -> InteractionEvent {
        match Self::resolve(engine, point) {
            Some(HitTarget::Group(id)) => {
                debug!(group_id = %id, "tap on group");
                InteractionEvent::ExpandRequested(id)
            }
            Some(HitTarget::Node(id)) => self.select(Some(id)),
            None => self.select(None),
        }
    }

    pub fn drag_start(&mut self, engine: &mut LayoutEngine, point: Pos2) -> Option<InteractionEvent> {
        self.release(engine);
        self.begin_follow(engine, point)
    }

    pub fn drag_move(&mut self, engine: &mut LayoutEngine, point: Pos2) -> Option<InteractionEvent> {
        if let Some(drag) = &self.drag {
            if engine.move_pointer(drag.constraint, point) {
                return None;
            }
            trace!(node_id = %drag.node_id, "dragged body is gone, re-resolving");
            self.drag = None;
        }
        self.begin_follow(engine, point)
    }

    pub fn drag_end(&mut self, engine: &mut LayoutEngine) {
        self.release(engine);
    }

    pub fn drag_cancel(&mut self, engine: &mut LayoutEngine) {
        self.release(engine);
    }

    fn begin_follow(&mut self, engine: &mut LayoutEngine, point: Pos2) -> Option<InteractionEvent> {
        match Self::resolve(engine, point)? {
            HitTarget::Group(id) => {
                debug!(group_id = %id, "drag on group treated as tap");
                Some(InteractionEvent::ExpandRequested(id))
            }
            HitTarget::Node(id) => {
                if let Some(constraint) = engine.attach_pointer(&id, point) {
                    self.drag = Some(ActiveDrag {
                        node_id: id.clone(),
                        constraint,
                    });
                }
                Some(self.select(Some(id)))
            }
        }
    }

    fn release(&mut self, engine: &mut LayoutEngine) {
        if let Some(drag) = self.drag.take()
            && !engine.release_pointer(drag.constraint)
        {
            trace!(node_id = %drag.node_id, "pointer constraint already gone");
        }
    }

    /// Drops per-gesture state after a rebuild and clears a selection that no
    /// longer exists in `graph`.
    pub fn reconcile(&mut self, graph: &TransactionGraph) -> Option<InteractionEvent> {
        self.drag = None;
        let stale = self
            .selected
            .as_deref()
            .is_some_and(|id| !graph.contains_node(id));
        if stale {
            debug!(selected = ?self.selected, "selection cleared, node no longer present");
            return Some(self.select(None));
        }
        None
    }
}

#[cfg(test)]
mod tests;
