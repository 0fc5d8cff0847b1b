use std::f32::consts::TAU;

use eframe::egui::Vec2;

use super::body::{Body, BodyHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstraintHandle {
    pub(super) world: u64,
    pub(super) index: u32,
}

/// Stiffness expressed as an oscillator frequency and damping ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Softness {
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl Softness {
    /// Returns `(gamma, bias_rate)` for an effective mass over one step of `h` seconds.
    fn coefficients(self, effective_mass: f32, h: f32) -> (f32, f32) {
        let omega = TAU * self.frequency_hz;
        let damping = 2.0 * effective_mass * self.damping_ratio * omega;
        let stiffness = effective_mass * omega * omega;
        let gamma = h * (damping + h * stiffness);
        let gamma = if gamma > 0.0 { 1.0 / gamma } else { 0.0 };
        (gamma, h * stiffness * gamma)
    }
}

/// Soft spring keeping two bodies near `rest_length` apart.
#[derive(Clone, Debug)]
pub struct DistanceConstraint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub rest_length: f32,
    pub softness: Softness,
    axis: Vec2,
    bias: f32,
    gamma: f32,
    soft_mass: f32,
    impulse: f32,
}

/// Pulls one body toward a moving target, capped at `max_force` per unit mass.
#[derive(Clone, Debug)]
pub struct PointerConstraint {
    pub body: BodyHandle,
    pub target: Vec2,
    pub max_force: f32,
    pub softness: Softness,
    bias: Vec2,
    gamma: f32,
    soft_mass: f32,
    impulse: Vec2,
    max_impulse: f32,
}

#[derive(Clone, Debug)]
pub enum Constraint {
    Distance(DistanceConstraint),
    Pointer(PointerConstraint),
}

impl DistanceConstraint {
    pub(super) fn new(
        body_a: BodyHandle,
        body_b: BodyHandle,
        rest_length: f32,
        softness: Softness,
    ) -> Self {
        Self {
            body_a,
            body_b,
            rest_length,
            softness,
            axis: Vec2::ZERO,
            bias: 0.0,
            gamma: 0.0,
            soft_mass: 0.0,
            impulse: 0.0,
        }
    }

    fn prepare(&mut self, bodies: &[Body], h: f32) {
        self.soft_mass = 0.0;
        self.impulse = 0.0;
        let (Some(a), Some(b)) = (
            bodies.get(self.body_a.index as usize),
            bodies.get(self.body_b.index as usize),
        ) else {
            return;
        };

        let delta = b.position - a.position;
        let length = delta.length();
        let inv_mass_sum = a.inv_mass + b.inv_mass;
        if inv_mass_sum <= 0.0 || length <= 0.0001 {
            return;
        }

        let (gamma, bias_rate) = self.softness.coefficients(1.0 / inv_mass_sum, h);
        self.axis = delta / length;
        self.gamma = gamma;
        self.bias = (length - self.rest_length) * bias_rate;
        self.soft_mass = 1.0 / (inv_mass_sum + gamma);
    }

    fn solve_velocity(&mut self, bodies: &mut [Body]) {
        let (index_a, index_b) = (self.body_a.index as usize, self.body_b.index as usize);
        if self.soft_mass <= 0.0 || index_a >= bodies.len() || index_b >= bodies.len() {
            return;
        }

        let relative = bodies[index_b].velocity - bodies[index_a].velocity;
        let cdot = relative.dot(self.axis);
        let impulse = -self.soft_mass * (cdot + self.bias + self.gamma * self.impulse);
        self.impulse += impulse;

        let push = self.axis * impulse;
        let inv_a = bodies[index_a].inv_mass;
        let inv_b = bodies[index_b].inv_mass;
        bodies[index_a].velocity -= push * inv_a;
        bodies[index_b].velocity += push * inv_b;
    }
}

impl PointerConstraint {
    pub(super) fn new(body: BodyHandle, target: Vec2, max_force: f32, softness: Softness) -> Self {
        Self {
            body,
            target,
            max_force,
            softness,
            bias: Vec2::ZERO,
            gamma: 0.0,
            soft_mass: 0.0,
            impulse: Vec2::ZERO,
            max_impulse: 0.0,
        }
    }

    fn prepare(&mut self, bodies: &[Body], h: f32) {
        self.soft_mass = 0.0;
        self.impulse = Vec2::ZERO;
        let Some(body) = bodies.get(self.body.index as usize) else {
            return;
        };
        if body.inv_mass <= 0.0 {
            return;
        }

        let mass = 1.0 / body.inv_mass;
        let (gamma, bias_rate) = self.softness.coefficients(mass, h);
        self.gamma = gamma;
        self.bias = (body.position - self.target) * bias_rate;
        self.soft_mass = 1.0 / (body.inv_mass + gamma);
        self.max_impulse = self.max_force * mass * h;
    }

    fn solve_velocity(&mut self, bodies: &mut [Body]) {
        if self.soft_mass <= 0.0 {
            return;
        }
        let Some(body) = bodies.get_mut(self.body.index as usize) else {
            return;
        };

        let impulse = -(body.velocity + self.bias + self.impulse * self.gamma) * self.soft_mass;
        let previous = self.impulse;
        self.impulse += impulse;
        let magnitude = self.impulse.length();
        if magnitude > self.max_impulse && magnitude > 0.0 {
            self.impulse *= self.max_impulse / magnitude;
        }
        body.velocity += (self.impulse - previous) * body.inv_mass;
    }
}

impl Constraint {
    pub(super) fn prepare(&mut self, bodies: &[Body], h: f32) {
        match self {
            Self::Distance(joint) => joint.prepare(bodies, h),
            Self::Pointer(joint) => joint.prepare(bodies, h),
        }
    }

    pub(super) fn solve_velocity(&mut self, bodies: &mut [Body]) {
        match self {
            Self::Distance(joint) => joint.solve_velocity(bodies),
            Self::Pointer(joint) => joint.solve_velocity(bodies),
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }
}
