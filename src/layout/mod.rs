mod engine;
mod lease;

use std::collections::HashMap;

use eframe::egui::Pos2;
use serde::Deserialize;

use crate::graph::{GraphNode, NodeRole};
use crate::physics::{Softness, WorldSettings};

pub use engine::LayoutEngine;
pub use lease::{Visibility, VisibilityLease};

/// Pixel size of the drawing surface plus its density (pixels per dp).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
    pub density: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32, density: f32) -> Self {
        Self {
            width,
            height,
            density,
        }
    }

    pub fn is_empty(&self) -> bool {
        let usable = |side: f32| side.is_finite() && side >= 1.0;
        !(usable(self.width) && usable(self.height))
    }

    pub fn shorter_side(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Density used for dp conversions; non-positive or non-finite values fall back to 1.
    pub fn scale(&self) -> f32 {
        if self.density.is_finite() && self.density > 0.0 {
            self.density
        } else {
            1.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// World units spanned by the canvas's shorter side.
    pub arena_world_units: f32,
    pub timestep_secs: f32,
    pub max_steps_per_advance: usize,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    pub body_mass: f32,
    pub linear_damping: f32,
    pub spring_frequency_hz: f32,
    pub spring_damping_ratio: f32,
    pub rest_length_scale: f32,
    pub min_rest_length: f32,
    pub max_rest_length: f32,
    pub repulsion_strength: f32,
    pub repulsion_softening: f32,
    pub repulsion_cutoff: f32,
    /// Node count up to which repulsion runs at full strength; larger graphs
    /// divide it among their nodes.
    pub repulsion_full_strength_nodes: f32,
    /// Arc length a neighbour claims on its spoke ring, in diameters.
    pub ring_spacing: f32,
    pub pointer_max_force: f32,
    pub pointer_frequency_hz: f32,
    pub pointer_damping_ratio: f32,
    pub sleep_speed: f32,
    pub time_to_sleep_secs: f32,
    pub io_radius_dp: f32,
    pub change_radius_dp: f32,
    pub fee_radius_dp: f32,
    pub group_radius_dp: f32,
    pub group_bump_dp_per_decade: f32,
    pub group_bump_max_dp: f32,
    pub hit_padding_dp: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            arena_world_units: 20.0,
            timestep_secs: 1.0 / 60.0,
            max_steps_per_advance: 4,
            velocity_iterations: 8,
            position_iterations: 3,
            body_mass: 1.0,
            linear_damping: 3.0,
            spring_frequency_hz: 2.0,
            spring_damping_ratio: 0.8,
            rest_length_scale: 2.5,
            min_rest_length: 2.0,
            max_rest_length: 4.0,
            repulsion_strength: 4.0,
            repulsion_softening: 0.25,
            repulsion_cutoff: 8.0,
            repulsion_full_strength_nodes: 6.0,
            ring_spacing: 1.5,
            pointer_max_force: 1000.0,
            pointer_frequency_hz: 5.0,
            pointer_damping_ratio: 0.7,
            sleep_speed: 0.02,
            time_to_sleep_secs: 0.5,
            io_radius_dp: 22.0,
            change_radius_dp: 18.0,
            fee_radius_dp: 16.0,
            group_radius_dp: 26.0,
            group_bump_dp_per_decade: 4.0,
            group_bump_max_dp: 10.0,
            hit_padding_dp: 12.0,
        }
    }
}

impl LayoutConfig {
    pub(crate) fn world_settings(&self, body_count: usize) -> WorldSettings {
        WorldSettings {
            velocity_iterations: self.velocity_iterations,
            position_iterations: self.position_iterations,
            repulsion_strength: self.repulsion_strength(body_count),
            repulsion_softening: self.repulsion_softening,
            repulsion_cutoff: self.repulsion_cutoff,
            sleep_speed: self.sleep_speed,
            time_to_sleep: self.time_to_sleep_secs,
            ..WorldSettings::default()
        }
    }

    /// Each body feels at most `repulsion_full_strength_nodes` neighbours' worth of push.
    pub fn repulsion_strength(&self, body_count: usize) -> f32 {
        let others = body_count.saturating_sub(1).max(1) as f32;
        self.repulsion_strength * (self.repulsion_full_strength_nodes / others).min(1.0)
    }

    pub(crate) fn spring(&self) -> Softness {
        Softness {
            frequency_hz: self.spring_frequency_hz,
            damping_ratio: self.spring_damping_ratio,
        }
    }

    pub(crate) fn pointer(&self) -> Softness {
        Softness {
            frequency_hz: self.pointer_frequency_hz,
            damping_ratio: self.pointer_damping_ratio,
        }
    }

    /// Rest length for a spring between bodies of the given world radii.
    pub fn rest_length(&self, radius_a: f32, radius_b: f32) -> f32 {
        ((radius_a + radius_b) * self.rest_length_scale)
            .clamp(self.min_rest_length, self.max_rest_length)
    }

    /// Node radius in dp. Collapsed groups grow with the log of their size.
    pub fn node_radius_dp(&self, node: &GraphNode, collapsed: bool) -> f32 {
        match node.role {
            NodeRole::Input | NodeRole::Output => self.io_radius_dp,
            NodeRole::Change => self.change_radius_dp,
            NodeRole::Fee => self.fee_radius_dp,
            NodeRole::Group if collapsed => {
                let bump = (node.children.max(1) as f32).log10() * self.group_bump_dp_per_decade;
                self.group_radius_dp + bump.min(self.group_bump_max_dp)
            }
            NodeRole::Group => self.group_radius_dp,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub center: Pos2,
    pub radius: f32,
}

/// Pixel-space positions published after every step, in graph node order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutSnapshot {
    nodes: Vec<NodeLayout>,
    index_by_id: HashMap<String, usize>,
}

impl LayoutSnapshot {
    pub(crate) fn from_nodes(nodes: Vec<NodeLayout>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        Self { nodes, index_by_id }
    }

    pub fn get(&self, id: &str) -> Option<&NodeLayout> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.nodes.get(index))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &NodeLayout> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [NodeLayout] {
        &mut self.nodes
    }
}
