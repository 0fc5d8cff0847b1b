use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::Arc;

use eframe::egui::{Pos2, Vec2, vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::graph::{GraphEdge, TransactionGraph};
use crate::physics::{BodyHandle, Constraint, ConstraintHandle, World};

use super::{CanvasSize, LayoutConfig, LayoutSnapshot, NodeLayout, Visibility};

/// Physics-driven layout for one graph on one canvas.
///
/// Built from scratch whenever either input changes; nothing carries over
/// between instances.
pub struct LayoutEngine {
    graph: Arc<TransactionGraph>,
    canvas: CanvasSize,
    config: LayoutConfig,
    visibility: Visibility,
    world: Option<World>,
    bodies: HashMap<String, BodyHandle>,
    body_order: Vec<BodyHandle>,
    edges: Vec<GraphEdge>,
    pixels_per_meter: f32,
    snapshot: LayoutSnapshot,
    accumulator: f32,
    steps: u64,
}

impl LayoutEngine {
    pub fn new(
        graph: Arc<TransactionGraph>,
        canvas: CanvasSize,
        config: LayoutConfig,
        visibility: Visibility,
    ) -> Self {
        let mut engine = Self {
            graph,
            canvas,
            config,
            visibility,
            world: None,
            bodies: HashMap::new(),
            body_order: Vec::new(),
            edges: Vec::new(),
            pixels_per_meter: 1.0,
            snapshot: LayoutSnapshot::default(),
            accumulator: 0.0,
            steps: 0,
        };
        engine.build();
        engine
    }

    fn build(&mut self) {
        if self.canvas.is_empty() || self.graph.nodes.is_empty() {
            debug!(
                width = self.canvas.width,
                height = self.canvas.height,
                nodes = self.graph.node_count(),
                "layout skipped, nothing to simulate"
            );
            return;
        }

        let config = self.config;
        let pixels_per_meter = self.canvas.shorter_side() / config.arena_world_units.max(1.0);
        let arena = vec2(self.canvas.width, self.canvas.height) / pixels_per_meter;
        let density = self.canvas.scale();

        let mut world = World::new(config.world_settings(self.graph.nodes.len()));
        world.add_arena(arena);

        let radii: HashMap<&str, f32> = self
            .graph
            .nodes
            .iter()
            .map(|node| {
                let collapsed = self.graph.is_collapsed(&node.id);
                let radius = config.node_radius_dp(node, collapsed) * density / pixels_per_meter;
                (node.id.as_str(), radius)
            })
            .collect();
        let spokes = SpokeRings::measure(&self.graph.edges, &radii, &config);

        let seed = self
            .graph
            .seed
            .wrapping_add(self.canvas.width.round() as u64)
            .wrapping_add(self.canvas.height.round() as u64);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut bodies = HashMap::with_capacity(self.graph.nodes.len());
        let mut body_order = Vec::with_capacity(self.graph.nodes.len());
        for node in &self.graph.nodes {
            let unscaled = radii.get(node.id.as_str()).copied().unwrap_or_default();
            let radius = unscaled * spokes.body_scale;
            let position = vec2(
                scatter(&mut rng, radius, arena.x),
                scatter(&mut rng, radius, arena.y),
            );
            let handle =
                world.add_dynamic_circle(position, radius, config.body_mass, config.linear_damping);
            bodies.insert(node.id.clone(), handle);
            body_order.push(handle);
        }

        let mut edges = Vec::with_capacity(self.graph.edges.len());
        for edge in &self.graph.edges {
            let (Some(&from), Some(&to)) = (bodies.get(&edge.from), bodies.get(&edge.to)) else {
                trace!(?edge, "edge skipped, endpoint not materialized");
                continue;
            };
            let radius_from = world.body(from).map_or(0.0, |body| body.radius());
            let radius_to = world.body(to).map_or(0.0, |body| body.radius());
            let rest_length = config
                .rest_length(radius_from, radius_to)
                .max(spokes.ring(&edge.from).max(spokes.ring(&edge.to)));
            if world
                .add_distance_constraint(from, to, rest_length, config.spring())
                .is_some()
            {
                edges.push(edge.clone());
            }
        }

        debug!(
            nodes = body_order.len(),
            edges = edges.len(),
            pixels_per_meter,
            body_scale = spokes.body_scale,
            seed,
            "layout engine built"
        );

        self.pixels_per_meter = pixels_per_meter;
        self.world = Some(world);
        self.bodies = bodies;
        self.body_order = body_order;
        self.edges = edges;
        self.snapshot = self.collect_snapshot();
    }

    fn collect_snapshot(&self) -> LayoutSnapshot {
        let Some(world) = self.world.as_ref() else {
            return LayoutSnapshot::default();
        };
        let nodes = self
            .graph
            .nodes
            .iter()
            .zip(&self.body_order)
            .filter_map(|(node, &handle)| {
                let body = world.body(handle)?;
                Some(NodeLayout {
                    id: node.id.clone(),
                    center: (body.position * self.pixels_per_meter).to_pos2(),
                    radius: body.radius() * self.pixels_per_meter,
                })
            })
            .collect();
        LayoutSnapshot::from_nodes(nodes)
    }

    fn publish(&mut self) {
        let Some(world) = self.world.as_ref() else {
            self.snapshot = LayoutSnapshot::default();
            return;
        };
        let pixels_per_meter = self.pixels_per_meter;
        for (layout, &handle) in self.snapshot.nodes_mut().iter_mut().zip(&self.body_order) {
            if let Some(body) = world.body(handle) {
                layout.center = (body.position * pixels_per_meter).to_pos2();
                layout.radius = body.radius() * pixels_per_meter;
            }
        }
    }

    /// Discards the simulation. Later pointer and step calls become no-ops.
    pub fn teardown(&mut self) {
        if self.world.take().is_some() {
            debug!(steps = self.steps, "layout engine torn down");
        }
        self.bodies.clear();
        self.body_order.clear();
        self.edges.clear();
        self.snapshot = LayoutSnapshot::default();
        self.accumulator = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.world.is_some() && self.visibility.is_visible()
    }

    /// Runs one fixed step when a view is visible. Returns whether bodies are still moving.
    pub fn step(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let timestep = self.config.timestep_secs;
        let moving = self
            .world
            .as_mut()
            .is_some_and(|world| world.step(timestep));
        self.steps += 1;
        self.publish();
        moving
    }

    /// Feeds elapsed wall time into the fixed-step cadence.
    ///
    /// At most `max_steps_per_advance` steps run per call; any larger backlog
    /// is dropped rather than caught up.
    pub fn advance(&mut self, elapsed_secs: f32) -> bool {
        if !self.is_running() {
            self.accumulator = 0.0;
            return false;
        }

        let timestep = self.config.timestep_secs.max(1e-4);
        let max_steps = self.config.max_steps_per_advance.max(1);
        if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
            self.accumulator += elapsed_secs.min(timestep * max_steps as f32);
        }

        let mut moving = false;
        let mut taken = 0;
        while self.accumulator >= timestep && taken < max_steps {
            moving |= self.step();
            self.accumulator -= timestep;
            taken += 1;
        }
        if taken == max_steps {
            self.accumulator = self.accumulator.min(timestep);
        }
        moving || self.is_awake()
    }

    pub fn is_awake(&self) -> bool {
        self.world.as_ref().is_some_and(|world| !world.is_sleeping())
    }

    pub fn graph(&self) -> &Arc<TransactionGraph> {
        &self.graph
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &LayoutSnapshot {
        &self.snapshot
    }

    /// Edges whose endpoints both have bodies, for line drawing.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn pixels_per_meter(&self) -> f32 {
        self.pixels_per_meter
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn body_handle(&self, node_id: &str) -> Option<BodyHandle> {
        self.bodies.get(node_id).copied()
    }

    pub fn to_world(&self, point: Pos2) -> Vec2 {
        point.to_vec2() / self.pixels_per_meter
    }

    fn to_pixels(&self, point: Vec2) -> Pos2 {
        (point * self.pixels_per_meter).to_pos2()
    }

    /// Pins `node_id` to `target` (pixels) until the returned handle is released.
    pub fn attach_pointer(&mut self, node_id: &str, target: Pos2) -> Option<ConstraintHandle> {
        let handle = self.body_handle(node_id)?;
        let target = self.to_world(target);
        let config = self.config;
        let world = self.world.as_mut()?;
        world.wake_body(handle);
        let constraint = world.add_pointer_constraint(
            handle,
            target,
            config.pointer_max_force,
            config.pointer(),
        )?;
        debug!(node_id, "pointer constraint attached");
        Some(constraint)
    }

    pub fn move_pointer(&mut self, constraint: ConstraintHandle, target: Pos2) -> bool {
        let target = self.to_world(target);
        self.world
            .as_mut()
            .is_some_and(|world| world.set_pointer_target(constraint, target))
    }

    pub fn release_pointer(&mut self, constraint: ConstraintHandle) -> bool {
        let released = self
            .world
            .as_mut()
            .is_some_and(|world| world.destroy_constraint(constraint));
        if released {
            debug!("pointer constraint released");
        }
        released
    }

    pub fn pointer_target(&self, constraint: ConstraintHandle) -> Option<Pos2> {
        match self.world.as_ref()?.constraint(constraint)? {
            Constraint::Pointer(joint) => Some(self.to_pixels(joint.target)),
            Constraint::Distance(_) => None,
        }
    }

    pub fn pointer_count(&self) -> usize {
        self.world.as_ref().map_or(0, World::pointer_count)
    }
}

/// Room each node needs around it so its neighbours fit on one ring.
///
/// A node's neighbours sit at roughly one rest length from it, so the ring can
/// be no wider than `max_rest_length`. When the busiest node's neighbours would
/// not fit, every body shrinks by the same factor until they do.
struct SpokeRings<'a> {
    body_scale: f32,
    rings: HashMap<&'a str, f32>,
}

impl<'a> SpokeRings<'a> {
    fn measure(edges: &'a [GraphEdge], radii: &HashMap<&str, f32>, config: &LayoutConfig) -> Self {
        let mut arcs: HashMap<&'a str, f32> = HashMap::new();
        for edge in edges {
            let (Some(&from), Some(&to)) = (radii.get(edge.from.as_str()), radii.get(edge.to.as_str()))
            else {
                continue;
            };
            *arcs.entry(edge.from.as_str()).or_default() += 2.0 * to * config.ring_spacing;
            *arcs.entry(edge.to.as_str()).or_default() += 2.0 * from * config.ring_spacing;
        }

        let room = TAU * config.max_rest_length;
        let widest = arcs.values().copied().fold(0.0_f32, f32::max);
        let body_scale = if widest > room { room / widest } else { 1.0 };
        let rings = arcs
            .into_iter()
            .map(|(id, arc)| (id, arc * body_scale / TAU))
            .collect();
        Self { body_scale, rings }
    }

    fn ring(&self, id: &str) -> f32 {
        self.rings.get(id).copied().unwrap_or_default()
    }
}

fn scatter(rng: &mut ChaCha8Rng, radius: f32, extent: f32) -> f32 {
    let low = radius;
    let high = extent - radius;
    if high > low {
        rng.gen_range(low..high)
    } else {
        extent * 0.5
    }
}
