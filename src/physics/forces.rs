use eframe::egui::{Vec2, vec2};

use super::body::{Body, Shape};

#[derive(Clone, Copy, Debug)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) cutoff: f32,
}

/// Direction used when two bodies sit on top of each other.
fn fallback_direction(i: usize, j: usize) -> Vec2 {
    let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Inverse-square push between every pair of dynamic circles within `cutoff`.
pub(super) fn accumulate_repulsion(bodies: &mut [Body], params: RepulsionParams) {
    let cutoff_sq = params.cutoff * params.cutoff;
    let count = bodies.len();
    for i in 0..count {
        if !bodies[i].is_dynamic() {
            continue;
        }
        for j in (i + 1)..count {
            if !bodies[j].is_dynamic() {
                continue;
            }

            let delta = bodies[i].position - bodies[j].position;
            let distance_sq = delta.length_sq();
            if distance_sq > cutoff_sq {
                continue;
            }
            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                fallback_direction(i, j)
            };

            let push = direction * (params.strength / (distance_sq + params.softening));
            bodies[i].force += push;
            bodies[j].force -= push;
        }
    }
}

/// Moves overlapping circles apart, split by inverse mass.
pub(super) fn resolve_circle_overlaps(bodies: &mut [Body], slop: f32) {
    let count = bodies.len();
    for i in 0..count {
        let Shape::Circle { radius: radius_i } = bodies[i].shape else {
            continue;
        };
        for j in (i + 1)..count {
            let Shape::Circle { radius: radius_j } = bodies[j].shape else {
                continue;
            };
            let inv_sum = bodies[i].inv_mass + bodies[j].inv_mass;
            if inv_sum <= 0.0 {
                continue;
            }

            let delta = bodies[i].position - bodies[j].position;
            let distance = delta.length();
            let overlap = radius_i + radius_j - distance;
            if overlap <= slop {
                continue;
            }
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                fallback_direction(i, j)
            };

            let correction = direction * (overlap - slop);
            let share_i = bodies[i].inv_mass / inv_sum;
            let share_j = bodies[j].inv_mass / inv_sum;
            bodies[i].position += correction * share_i;
            bodies[j].position -= correction * share_j;
        }
    }
}

/// Keeps every dynamic circle on the inner side of each boundary segment and
/// drops the velocity component pointing out of the arena.
pub(super) fn resolve_boundaries(bodies: &mut [Body], walls: &[(Vec2, Vec2)]) {
    for body in bodies.iter_mut().filter(|body| body.is_dynamic()) {
        let radius = body.radius();
        for &(point, inward) in walls {
            let depth = radius - (body.position - point).dot(inward);
            if depth <= 0.0 {
                continue;
            }
            body.position += inward * depth;
            let normal_speed = body.velocity.dot(inward);
            if normal_speed < 0.0 {
                body.velocity -= inward * normal_speed;
            }
        }
    }
}
