use std::collections::HashMap;
use std::time::{Duration, Instant};

use egui::Color32;

use crate::gui::node_shape::CATEGORY20;
use crate::network::node::{Entity, Node};

/// Fade-in of freshly entered nodes.
pub const ENTER_FADE: Duration = Duration::from_millis(300);

/// Ordinal colour scale: every new key takes the next palette slot and keeps
/// it for the lifetime of the scale.
#[derive(Debug, Default, Clone)]
pub struct OrdinalPalette {
    assigned: HashMap<u64, usize>,
}

impl OrdinalPalette {
    pub fn color(&mut self, key: u64) -> Color32 {
        let next = self.assigned.len();
        let slot = *self.assigned.entry(key).or_insert(next);
        CATEGORY20[slot % CATEGORY20.len()]
    }
}

/// Per-element render state kept across frames.
#[derive(Debug, Clone)]
pub struct SceneElement {
    pub entity: Entity,
    pub fill: Color32,
    pub created: Instant,
}

impl SceneElement {
    pub fn fade_in(&self) -> f32 {
        let linear =
            (self.created.elapsed().as_secs_f32() / ENTER_FADE.as_secs_f32()).clamp(0.0, 1.0);
        ease_in_out_cubic(linear)
    }

    pub fn is_animating(&self) -> bool {
        self.created.elapsed() < ENTER_FADE
    }
}

/// Element ids touched by one join.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JoinDiff {
    pub entered: Vec<u64>,
    pub updated: Vec<u64>,
    pub exited: Vec<u64>,
}

/// Keyed node elements of the canvas. Nodes are keyed by their surrogate id,
/// links are not kept here and are redrawn from the graph every frame.
#[derive(Debug, Default)]
pub struct Scene {
    elements: HashMap<u64, SceneElement>,
    palette: OrdinalPalette,
}

impl Scene {
    /// Bind the current node list to the scene. An id that reappears with a
    /// different entity is a different element and enters again.
    pub fn join(&mut self, nodes: &[Node]) -> JoinDiff {
        let mut diff = JoinDiff::default();
        let mut next = HashMap::with_capacity(nodes.len());

        for node in nodes.iter().filter(|node| node.entity != Entity::Other) {
            if next.contains_key(&node.id) {
                continue;
            }
            let fill = self.palette.color(node.id);
            let element = match self.elements.remove(&node.id) {
                Some(existing) if existing.entity == node.entity => {
                    diff.updated.push(node.id);
                    SceneElement { fill, ..existing }
                }
                _ => {
                    diff.entered.push(node.id);
                    SceneElement {
                        entity: node.entity,
                        fill,
                        created: Instant::now(),
                    }
                }
            };
            next.insert(node.id, element);
        }

        diff.exited = self.elements.drain().map(|(id, _)| id).collect();
        diff.exited.sort_unstable();
        self.elements = next;
        diff
    }

    pub fn element(&self, id: u64) -> Option<&SceneElement> {
        self.elements.get(&id)
    }

    pub fn is_animating(&self) -> bool {
        self.elements.values().any(SceneElement::is_animating)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t.powi(3)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
