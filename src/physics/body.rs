use eframe::egui::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    pub(super) world: u64,
    pub(super) index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// One side of the arena; `inward` points into the playable area.
    Segment { start: Vec2, end: Vec2, inward: Vec2 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Static,
}

#[derive(Clone, Debug)]
pub struct Body {
    pub kind: BodyKind,
    pub shape: Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub(super) inv_mass: f32,
    pub(super) linear_damping: f32,
    pub(super) force: Vec2,
    pub(super) awake: bool,
    pub(super) sleep_time: f32,
}

impl Body {
    pub(super) fn dynamic_circle(position: Vec2, radius: f32, mass: f32, linear_damping: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            shape: Shape::Circle { radius },
            position,
            velocity: Vec2::ZERO,
            inv_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            linear_damping,
            force: Vec2::ZERO,
            awake: true,
            sleep_time: 0.0,
        }
    }

    pub(super) fn static_segment(start: Vec2, end: Vec2, inward: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            shape: Shape::Segment { start, end, inward },
            position: (start + end) * 0.5,
            velocity: Vec2::ZERO,
            inv_mass: 0.0,
            linear_damping: 0.0,
            force: Vec2::ZERO,
            awake: false,
            sleep_time: 0.0,
        }
    }

    pub fn radius(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Segment { .. } => 0.0,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    pub(super) fn wake(&mut self) {
        if self.is_dynamic() {
            self.awake = true;
            self.sleep_time = 0.0;
        }
    }

    pub(super) fn sleep(&mut self) {
        self.awake = false;
        self.velocity = Vec2::ZERO;
        self.force = Vec2::ZERO;
    }
}
