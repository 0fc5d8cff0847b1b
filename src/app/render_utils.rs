use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use txgraph::graph::{GraphNode, NodeRole};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = 56.0;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));
    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn node_color(node: &GraphNode) -> Color32 {
    if node.is_hub() {
        return Color32::from_rgb(236, 239, 244);
    }
    let base = match node.role {
        NodeRole::Input => Color32::from_rgb(94, 160, 230),
        NodeRole::Output => Color32::from_rgb(120, 196, 132),
        NodeRole::Change => Color32::from_rgb(182, 148, 226),
        NodeRole::Fee => Color32::from_rgb(232, 120, 96),
        NodeRole::Group => Color32::from_rgb(226, 180, 88),
    };
    if node.is_mine {
        blend_color(base, Color32::WHITE, 0.18)
    } else {
        base
    }
}
