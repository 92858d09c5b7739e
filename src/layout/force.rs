use rand::Rng;

use crate::network::network_graph::NetworkGraph;

const ALPHA_RESTART: f32 = 0.1;
const ALPHA_DECAY: f32 = 0.99;
const ALPHA_MIN: f32 = 0.005;
// Squared distances below this are treated as coincident nodes.
const MIN_DISTANCE_SQ: f32 = 1.0;

/// Tunable force coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// Pairwise charge; negative values repel.
    pub charge: f32,
    /// Rest length of link springs.
    pub link_distance: f32,
    pub link_strength: f32,
    /// Pull toward the viewport centre.
    pub gravity: f32,
    /// Velocity retained per tick.
    pub friction: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            charge: -400.0,
            link_distance: 60.0,
            link_strength: 1.0,
            gravity: 0.1,
            friction: 0.9,
        }
    }
}

/// Cooling force-directed simulation over the live graph.
///
/// Each tick applies link springs, centre gravity and pairwise charge to the
/// velocity of every unpinned node, then integrates positions and keeps them
/// inside the viewport. `alpha` scales all forces and decays every tick; the
/// simulation stops once it falls below a threshold and is woken up again by
/// `restart`.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    pub params: ForceParams,
    alpha: f32,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new(ForceParams::default())
    }
}

impl ForceLayout {
    pub fn new(params: ForceParams) -> Self {
        Self { params, alpha: 0.0 }
    }

    pub fn restart(&mut self) {
        self.alpha = ALPHA_RESTART;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.alpha > 0.0
    }

    /// Advance the simulation by one step. Returns whether it is still running.
    pub fn tick(&mut self, graph: &mut NetworkGraph) -> bool {
        if !self.is_running() {
            return false;
        }
        self.alpha *= ALPHA_DECAY;
        if self.alpha < ALPHA_MIN {
            self.alpha = 0.0;
            return false;
        }

        let alpha = self.alpha;
        let ForceParams {
            charge,
            link_distance,
            link_strength,
            gravity,
            friction,
        } = self.params;
        let viewport = graph.viewport();
        let count = graph.nodes.len();
        if count == 0 {
            return true;
        }

        let positions: Vec<(f32, f32)> = graph.nodes.iter().map(|n| (n.x, n.y)).collect();
        let mut delta = vec![(0.0f32, 0.0f32); count];

        // Springs, split between endpoints by degree so hubs move less.
        let mut degree = vec![0usize; count];
        for link in &graph.links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }
        for link in &graph.links {
            let (s, t) = (link.source, link.target);
            if s == t {
                continue;
            }
            let (mut x, mut y) = (positions[t].0 - positions[s].0, positions[t].1 - positions[s].1);
            let length_sq = x * x + y * y;
            if length_sq <= f32::EPSILON {
                continue;
            }
            let length = length_sq.sqrt();
            let force = alpha * link_strength * (length - link_distance) / length;
            x *= force;
            y *= force;
            let k = degree[s] as f32 / (degree[s] + degree[t]) as f32;
            delta[t].0 -= x * k;
            delta[t].1 -= y * k;
            delta[s].0 += x * (1.0 - k);
            delta[s].1 += y * (1.0 - k);
        }

        let k = alpha * gravity;
        if k != 0.0 {
            let (cx, cy) = viewport.center();
            for (i, (x, y)) in positions.iter().enumerate() {
                delta[i].0 += (cx - x) * k;
                delta[i].1 += (cy - y) * k;
            }
        }

        if charge != 0.0 {
            let mut rng = rand::rng();
            for i in 0..count {
                for j in (i + 1)..count {
                    let mut x = positions[j].0 - positions[i].0;
                    let mut y = positions[j].1 - positions[i].1;
                    let mut dist_sq = x * x + y * y;
                    if dist_sq < f32::EPSILON {
                        // Coincident nodes: pick a random direction to push apart.
                        x = rng.random_range(-0.5..0.5);
                        y = rng.random_range(-0.5..0.5);
                        dist_sq = x * x + y * y;
                    }
                    let k = alpha * charge / dist_sq.max(MIN_DISTANCE_SQ);
                    delta[i].0 += x * k;
                    delta[i].1 += y * k;
                    delta[j].0 -= x * k;
                    delta[j].1 -= y * k;
                }
            }
        }

        for (node, (dx, dy)) in graph.nodes.iter_mut().zip(delta) {
            if node.fixed {
                node.vx = 0.0;
                node.vy = 0.0;
                continue;
            }
            node.vx = (node.vx + dx) * friction;
            node.vy = (node.vy + dy) * friction;
            node.x += node.vx;
            node.y += node.vy;

            if viewport.width > 0.0 && !(0.0..=viewport.width).contains(&node.x) {
                node.x = node.x.clamp(0.0, viewport.width);
                node.vx = 0.0;
            }
            if viewport.height > 0.0 && !(0.0..=viewport.height).contains(&node.y) {
                node.y = node.y.clamp(0.0, viewport.height);
                node.vy = 0.0;
            }
        }
        true
    }
}
