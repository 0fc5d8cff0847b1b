//! Minimal 2D world used for graph layout: point-mass circles, soft distance
//! constraints, a pointer constraint and a static rectangular arena.

mod body;
mod constraint;
mod forces;

use std::sync::atomic::{AtomicU64, Ordering};

use eframe::egui::{Vec2, vec2};
use tracing::trace;

pub use body::{Body, BodyHandle, BodyKind, Shape};
pub use constraint::{
    Constraint, ConstraintHandle, DistanceConstraint, PointerConstraint, Softness,
};
use forces::{RepulsionParams, accumulate_repulsion, resolve_boundaries, resolve_circle_overlaps};

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldSettings {
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    pub repulsion_strength: f32,
    pub repulsion_softening: f32,
    pub repulsion_cutoff: f32,
    pub overlap_slop: f32,
    /// Largest distance a body may travel in a single step.
    pub max_translation: f32,
    pub sleep_speed: f32,
    pub time_to_sleep: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            velocity_iterations: 8,
            position_iterations: 3,
            repulsion_strength: 4.0,
            repulsion_softening: 0.25,
            repulsion_cutoff: 8.0,
            overlap_slop: 0.005,
            max_translation: 2.0,
            sleep_speed: 0.02,
            time_to_sleep: 0.5,
        }
    }
}

pub struct World {
    id: u64,
    settings: WorldSettings,
    bodies: Vec<Body>,
    constraints: Vec<Option<Constraint>>,
}

impl World {
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            id: NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed),
            settings,
            bodies: Vec::new(),
            constraints: Vec::new(),
        }
    }

    fn body_handle(&self, index: usize) -> BodyHandle {
        BodyHandle {
            world: self.id,
            index: index as u32,
        }
    }

    fn resolve_body(&self, handle: BodyHandle) -> Option<usize> {
        let index = handle.index as usize;
        (handle.world == self.id && index < self.bodies.len()).then_some(index)
    }

    fn resolve_constraint(&self, handle: ConstraintHandle) -> Option<usize> {
        let index = handle.index as usize;
        (handle.world == self.id && self.constraints.get(index).is_some_and(Option::is_some))
            .then_some(index)
    }

    pub fn add_dynamic_circle(
        &mut self,
        position: Vec2,
        radius: f32,
        mass: f32,
        linear_damping: f32,
    ) -> BodyHandle {
        self.bodies
            .push(Body::dynamic_circle(position, radius, mass, linear_damping));
        self.body_handle(self.bodies.len() - 1)
    }

    pub fn add_static_segment(&mut self, start: Vec2, end: Vec2, inward: Vec2) -> BodyHandle {
        self.bodies
            .push(Body::static_segment(start, end, inward.normalized()));
        self.body_handle(self.bodies.len() - 1)
    }

    /// Four inward-facing segments enclosing `[0, size.x] x [0, size.y]`.
    pub fn add_arena(&mut self, size: Vec2) -> [BodyHandle; 4] {
        let top_left = Vec2::ZERO;
        let top_right = vec2(size.x, 0.0);
        let bottom_right = size;
        let bottom_left = vec2(0.0, size.y);
        [
            self.add_static_segment(top_left, top_right, vec2(0.0, 1.0)),
            self.add_static_segment(top_right, bottom_right, vec2(-1.0, 0.0)),
            self.add_static_segment(bottom_right, bottom_left, vec2(0.0, -1.0)),
            self.add_static_segment(bottom_left, top_left, vec2(1.0, 0.0)),
        ]
    }

    fn push_constraint(&mut self, constraint: Constraint) -> ConstraintHandle {
        let slot = self.constraints.iter().position(Option::is_none);
        let index = match slot {
            Some(index) => {
                self.constraints[index] = Some(constraint);
                index
            }
            None => {
                self.constraints.push(Some(constraint));
                self.constraints.len() - 1
            }
        };
        ConstraintHandle {
            world: self.id,
            index: index as u32,
        }
    }

    pub fn add_distance_constraint(
        &mut self,
        body_a: BodyHandle,
        body_b: BodyHandle,
        rest_length: f32,
        softness: Softness,
    ) -> Option<ConstraintHandle> {
        self.resolve_body(body_a)?;
        self.resolve_body(body_b)?;
        if body_a == body_b {
            return None;
        }
        Some(self.push_constraint(Constraint::Distance(DistanceConstraint::new(
            body_a,
            body_b,
            rest_length,
            softness,
        ))))
    }

    /// Anchors `body` to `target`, waking it if it was asleep.
    pub fn add_pointer_constraint(
        &mut self,
        body: BodyHandle,
        target: Vec2,
        max_force: f32,
        softness: Softness,
    ) -> Option<ConstraintHandle> {
        let index = self.resolve_body(body)?;
        if !self.bodies[index].is_dynamic() {
            return None;
        }
        self.wake_all();
        Some(self.push_constraint(Constraint::Pointer(PointerConstraint::new(
            body, target, max_force, softness,
        ))))
    }

    /// Moves a pointer constraint's target. Returns false for unknown handles.
    pub fn set_pointer_target(&mut self, handle: ConstraintHandle, target: Vec2) -> bool {
        let Some(index) = self.resolve_constraint(handle) else {
            return false;
        };
        let Some(Constraint::Pointer(joint)) = self.constraints[index].as_mut() else {
            return false;
        };
        joint.target = target;
        self.wake_all();
        true
    }

    /// Removes a constraint. Unknown or already removed handles are ignored.
    pub fn destroy_constraint(&mut self, handle: ConstraintHandle) -> bool {
        let Some(index) = self.resolve_constraint(handle) else {
            trace!(?handle, "ignoring removal of unknown constraint");
            return false;
        };
        self.constraints[index] = None;
        self.wake_all();
        true
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.resolve_body(handle).map(|index| &self.bodies[index])
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.resolve_constraint(handle)
            .and_then(|index| self.constraints[index].as_ref())
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().flatten()
    }

    pub fn pointer_count(&self) -> usize {
        self.constraints().filter(|c| c.is_pointer()).count()
    }

    pub fn wake_body(&mut self, handle: BodyHandle) {
        if self.resolve_body(handle).is_some() {
            self.wake_all();
        }
    }

    // Every node hangs off the hub, so the whole world is one island.
    fn wake_all(&mut self) {
        for body in &mut self.bodies {
            body.wake();
        }
    }

    pub fn is_sleeping(&self) -> bool {
        !self
            .bodies
            .iter()
            .any(|body| body.is_dynamic() && body.is_awake())
    }

    /// Advances the world by `h` seconds. Returns whether anything is still moving.
    pub fn step(&mut self, h: f32) -> bool {
        if h <= 0.0 || self.is_sleeping() {
            return false;
        }
        let settings = self.settings;

        for body in &mut self.bodies {
            body.force = Vec2::ZERO;
        }
        accumulate_repulsion(
            &mut self.bodies,
            RepulsionParams {
                strength: settings.repulsion_strength,
                softening: settings.repulsion_softening,
                cutoff: settings.repulsion_cutoff,
            },
        );

        for body in self.bodies.iter_mut().filter(|body| body.is_dynamic()) {
            body.velocity += body.force * (body.inv_mass * h);
            body.velocity *= 1.0 / (1.0 + h * body.linear_damping);
        }

        for constraint in self.constraints.iter_mut().flatten() {
            constraint.prepare(&self.bodies, h);
        }
        for _ in 0..settings.velocity_iterations {
            for constraint in self.constraints.iter_mut().flatten() {
                constraint.solve_velocity(&mut self.bodies);
            }
        }

        for body in self.bodies.iter_mut().filter(|body| body.is_dynamic()) {
            let mut translation = body.velocity * h;
            let length = translation.length();
            if length > settings.max_translation {
                translation *= settings.max_translation / length;
                body.velocity = translation / h;
            }
            body.position += translation;
        }

        let walls = self
            .bodies
            .iter()
            .filter_map(|body| match body.shape {
                Shape::Segment { start, inward, .. } => Some((start, inward)),
                Shape::Circle { .. } => None,
            })
            .collect::<Vec<_>>();
        for _ in 0..settings.position_iterations {
            resolve_circle_overlaps(&mut self.bodies, settings.overlap_slop);
            resolve_boundaries(&mut self.bodies, &walls);
        }

        self.update_sleep(h)
    }

    fn update_sleep(&mut self, h: f32) -> bool {
        let held = self.constraints().any(Constraint::is_pointer);
        let sleep_speed_sq = self.settings.sleep_speed * self.settings.sleep_speed;
        let mut min_sleep_time = f32::INFINITY;
        for body in self.bodies.iter_mut().filter(|body| body.is_dynamic()) {
            if held || body.velocity.length_sq() > sleep_speed_sq {
                body.sleep_time = 0.0;
            } else {
                body.sleep_time += h;
            }
            min_sleep_time = min_sleep_time.min(body.sleep_time);
        }

        if min_sleep_time.is_finite() && min_sleep_time >= self.settings.time_to_sleep {
            for body in self.bodies.iter_mut().filter(|body| body.is_dynamic()) {
                body.sleep();
            }
            trace!(world = self.id, "world fell asleep");
            return false;
        }
        min_sleep_time.is_finite()
    }
}
