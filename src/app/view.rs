use eframe::egui::{
    self, Align2, Color32, FontId, PointerButton, Pos2, Rect, Sense, Stroke, Ui, Vec2, vec2,
};

use txgraph::layout::CanvasSize;
use txgraph::session::GraphSession;
use txgraph::util::short_label;

use super::TxGraphApp;
use super::render_utils::{blend_color, dim_color, draw_background, node_color};

/// Maps between egui points inside `rect` and layout pixels.
#[derive(Clone, Copy)]
struct CanvasTransform {
    origin: Pos2,
    pixels_per_point: f32,
}

impl CanvasTransform {
    fn to_screen(self, pixel: Pos2) -> Pos2 {
        self.origin + pixel.to_vec2() / self.pixels_per_point
    }

    fn to_canvas(self, screen: Pos2) -> Pos2 {
        ((screen - self.origin) * self.pixels_per_point).to_pos2()
    }

    fn radius(self, pixels: f32) -> f32 {
        pixels / self.pixels_per_point
    }
}

pub(super) enum GestureInput {
    Start(Pos2),
    Move(Pos2),
    Cancel,
    Stop,
}

/// Per-gesture pointer state. Once cancelled, the rest of the gesture is ignored
/// until the button is released.
#[derive(Default)]
pub(super) struct DragGesture {
    cancelled: bool,
}

impl DragGesture {
    pub(super) fn forward(&mut self, session: &mut GraphSession, input: GestureInput) {
        match input {
            GestureInput::Start(point) => {
                self.cancelled = false;
                session.drag_start(point);
            }
            GestureInput::Move(point) => {
                if !self.cancelled {
                    session.drag_move(point);
                }
            }
            GestureInput::Cancel => {
                if !self.cancelled {
                    self.cancelled = true;
                    session.drag_cancel();
                }
            }
            GestureInput::Stop => {
                if !std::mem::take(&mut self.cancelled) {
                    session.drag_end();
                }
            }
        }
    }
}

impl TxGraphApp {
    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        let pixels_per_point = ui.ctx().pixels_per_point();
        let transform = CanvasTransform {
            origin: rect.min,
            pixels_per_point,
        };
        self.session.set_canvas(CanvasSize::new(
            rect.width() * pixels_per_point,
            rect.height() * pixels_per_point,
            pixels_per_point,
        ));

        self.handle_pointer(ui, &response, transform);

        let elapsed = ui.ctx().input(|input| input.stable_dt);
        self.session.advance(elapsed);
        if self.session.is_awake() || response.dragged() {
            ui.ctx().request_repaint();
        }

        self.paint(ui, &painter, rect, transform, response.hover_pos());
    }

    fn handle_pointer(&mut self, ui: &Ui, response: &egui::Response, transform: CanvasTransform) {
        let pointer = response.interact_pointer_pos().map(|pos| transform.to_canvas(pos));

        if response.drag_started_by(PointerButton::Primary)
            && let Some(point) = pointer
        {
            self.drag.forward(&mut self.session, GestureInput::Start(point));
        } else if response.dragged_by(PointerButton::Primary)
            && let Some(point) = pointer
        {
            let input = if ui.input(|input| input.key_pressed(egui::Key::Escape)) {
                GestureInput::Cancel
            } else {
                GestureInput::Move(point)
            };
            self.drag.forward(&mut self.session, input);
        }
        if response.drag_stopped() {
            self.drag.forward(&mut self.session, GestureInput::Stop);
        }

        if response.clicked_by(PointerButton::Primary)
            && let Some(point) = pointer
        {
            self.session.tap(point);
        }
    }

    fn paint(
        &mut self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        transform: CanvasTransform,
        hover: Option<Pos2>,
    ) {
        let search_matches = self.search_matches();
        let search_active = search_matches.as_ref().is_some_and(|matches| !matches.is_empty());
        let selected_id = self.session.selected_id().map(str::to_owned);
        let graph = std::sync::Arc::clone(self.session.graph());
        let snapshot = self.session.snapshot();

        if snapshot.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Nothing to lay out",
                FontId::proportional(15.0),
                Color32::from_gray(180),
            );
            return;
        }

        for edge in self.session.edges() {
            let (Some(from), Some(to)) = (snapshot.get(&edge.from), snapshot.get(&edge.to)) else {
                continue;
            };
            let touches_selection = selected_id
                .as_deref()
                .is_some_and(|id| edge.touches(id));
            let stroke = if touches_selection {
                Stroke::new(2.4, Color32::from_rgb(241, 146, 94))
            } else {
                Stroke::new(1.3, Color32::from_rgba_unmultiplied(120, 128, 140, 190))
            };
            painter.line_segment(
                [transform.to_screen(from.center), transform.to_screen(to.center)],
                stroke,
            );
        }

        let selected_color = Color32::from_rgb(245, 206, 93);
        let hovered = hover.and_then(|pos| {
            snapshot.iter().rev().find(|layout| {
                transform.to_screen(layout.center).distance(pos) <= transform.radius(layout.radius)
            })
        });
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        for layout in snapshot.iter() {
            let Some(node) = graph.node(&layout.id) else {
                continue;
            };
            let center = transform.to_screen(layout.center);
            let radius = transform.radius(layout.radius);
            let is_selected = selected_id.as_deref() == Some(layout.id.as_str());
            let is_hovered = hovered.is_some_and(|hovered| hovered.id == layout.id);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&layout.id));

            let base = node_color(node);
            let color = if is_selected {
                selected_color
            } else if is_hovered {
                blend_color(base, Color32::from_rgb(255, 164, 101), 0.55)
            } else if is_match {
                blend_color(base, Color32::from_rgb(103, 196, 255), 0.68)
            } else if search_active {
                dim_color(base, 0.4)
            } else {
                base
            };

            painter.circle_filled(center, radius, color);
            painter.circle_stroke(
                center,
                radius,
                Stroke::new(
                    if is_match { 1.6 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );
            if is_selected {
                painter.circle_stroke(
                    center,
                    radius + 4.0,
                    Stroke::new(1.6, Color32::from_rgba_unmultiplied(245, 206, 93, 150)),
                );
            }

            if graph.is_collapsed(&node.id) {
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    node.children.to_string(),
                    FontId::proportional(12.0),
                    Color32::from_gray(20),
                );
            }

            let label = if graph.is_collapsed(&node.id) {
                format!("{} ({})", node.id, node.children)
            } else {
                short_label(node.display_label(), 6)
            };
            painter.text(
                center + vec2(radius + 5.0, 0.0),
                Align2::LEFT_CENTER,
                label,
                FontId::proportional(12.0),
                Color32::from_gray(238),
            );
        }

        if let Some(layout) = hovered
            && let Some(node) = graph.node(&layout.id)
        {
            painter.text(
                rect.left_top() + Vec2::splat(10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}", node.role.label(), node.display_label()),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Pos2;
    use txgraph::config::Config;
    use txgraph::graph::HUB_ID;
    use txgraph::layout::CanvasSize;
    use txgraph::session::GraphSession;
    use txgraph::tx::demo_transaction;

    use super::{DragGesture, GestureInput};

    fn settled_session() -> GraphSession {
        let mut session = GraphSession::from_transaction(&demo_transaction(), &Config::default());
        session.set_canvas(CanvasSize::new(800.0, 600.0, 1.0));
        let _lease = session.acquire_lease();
        for _ in 0..300 {
            session.step();
        }
        session
    }

    fn hub_center(session: &GraphSession) -> Pos2 {
        session.snapshot().get(HUB_ID).expect("hub").center
    }

    #[test]
    fn cancelled_drag_ignores_moves_until_release() {
        let mut session = settled_session();
        let mut gesture = DragGesture::default();
        let hub = hub_center(&session);

        gesture.forward(&mut session, GestureInput::Start(hub));
        assert_eq!(session.engine().pointer_count(), 1);

        gesture.forward(&mut session, GestureInput::Cancel);
        assert_eq!(session.engine().pointer_count(), 0);

        gesture.forward(&mut session, GestureInput::Move(hub));
        gesture.forward(&mut session, GestureInput::Cancel);
        gesture.forward(&mut session, GestureInput::Move(hub));
        assert_eq!(session.engine().pointer_count(), 0);

        gesture.forward(&mut session, GestureInput::Stop);
        gesture.forward(&mut session, GestureInput::Start(hub));
        assert_eq!(session.engine().pointer_count(), 1);
        gesture.forward(&mut session, GestureInput::Stop);
        assert_eq!(session.engine().pointer_count(), 0);
    }

    #[test]
    fn uncancelled_drag_keeps_following() {
        let mut session = settled_session();
        let mut gesture = DragGesture::default();
        let hub = hub_center(&session);

        gesture.forward(&mut session, GestureInput::Move(hub));
        assert_eq!(session.engine().pointer_count(), 1);
        gesture.forward(&mut session, GestureInput::Stop);
        assert_eq!(session.engine().pointer_count(), 0);
    }
}
