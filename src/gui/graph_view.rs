use std::time::{Duration, Instant};

use egui::{Id, Pos2, Sense, Ui};
use tracing::debug;

use crate::{
    gui::{
        edge_shape, node_shape,
        scene::Scene,
        tooltip::{FloatingTooltip, line_list, link_tooltip, node_tooltip},
    },
    layout::ForceLayout,
    network::{
        network_graph::{NetworkGraph, NodeHandle, Viewport},
        node::Entity,
    },
};

const TOOLTIP_FADE: Duration = Duration::from_millis(200);

/// Element under the pointer, as indices into the live graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hovered {
    Node(usize),
    Link(usize),
}

// Hover identity that survives a reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoverKey {
    Node(NodeHandle),
    Link(NodeHandle, NodeHandle),
}

/// Pointer state kept by the app between frames.
#[derive(Debug, Default)]
pub struct InteractionState {
    dragging: Option<NodeHandle>,
    hover: Option<(HoverKey, Instant)>,
}

impl InteractionState {
    /// Grab the node under `pos` and pin it. Returns false when the press
    /// missed every node.
    pub fn begin_drag(&mut self, graph: &mut NetworkGraph, pos: Pos2) -> bool {
        let Some(Hovered::Node(index)) = pick(graph, pos) else {
            return false;
        };
        debug!(target: "graph_view", node = %graph.nodes[index].key(), "Drag started, pinning node");
        graph.set_fixed(index, true);
        self.dragging = graph.node_handle(index);
        self.dragging.is_some()
    }

    /// Move the grabbed node to `pos`. Returns false when nothing is grabbed
    /// or the node left the graph.
    pub fn drag_to(&mut self, graph: &mut NetworkGraph, pos: Pos2) -> bool {
        match self.dragging.and_then(|handle| graph.node_index(handle)) {
            Some(index) => {
                drag_node(graph, index, pos);
                true
            }
            None => false,
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = None;
    }
}

/// Topmost element at `pos` (canvas space). UEs are drawn above eNBs and
/// nodes above links, so hits are resolved in that order.
pub fn pick(graph: &NetworkGraph, pos: Pos2) -> Option<Hovered> {
    for entity in [Entity::Ue, Entity::Enb] {
        let hit = graph
            .nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| node.entity == entity && node_shape::is_inside(node, pos));
        if let Some((index, _)) = hit {
            return Some(Hovered::Node(index));
        }
    }
    graph
        .links
        .iter()
        .enumerate()
        .rev()
        .find(|(_, link)| {
            let (a, b) = (&graph.nodes[link.source], &graph.nodes[link.target]);
            edge_shape::is_inside(Pos2::new(a.x, a.y), Pos2::new(b.x, b.y), link, pos)
        })
        .map(|(index, _)| Hovered::Link(index))
}

/// Move a node to `pos` and pin it there.
pub fn drag_node(graph: &mut NetworkGraph, index: usize, pos: Pos2) {
    let viewport = graph.viewport();
    if let Some(node) = graph.nodes.get_mut(index) {
        node.x = pos.x.clamp(0.0, viewport.width.max(0.0));
        node.y = pos.y.clamp(0.0, viewport.height.max(0.0));
        node.vx = 0.0;
        node.vy = 0.0;
        node.fixed = true;
    }
}

fn hover_key(graph: &NetworkGraph, hovered: Hovered) -> Option<HoverKey> {
    match hovered {
        Hovered::Node(index) => graph.node_handle(index).map(HoverKey::Node),
        Hovered::Link(index) => {
            let link = graph.links.get(index)?;
            Some(HoverKey::Link(graph.node_handle(link.source)?, graph.node_handle(link.target)?))
        }
    }
}

/// The graph canvas: steps the simulation, handles pointer interaction and
/// paints links, eNBs and UEs in that order.
pub struct GraphView<'a> {
    graph: &'a mut NetworkGraph,
    layout: &'a mut ForceLayout,
    scene: &'a Scene,
    state: &'a mut InteractionState,
}

impl<'a> GraphView<'a> {
    pub fn new(
        graph: &'a mut NetworkGraph,
        layout: &'a mut ForceLayout,
        scene: &'a Scene,
        state: &'a mut InteractionState,
    ) -> Self {
        Self {
            graph,
            layout,
            scene,
            state,
        }
    }

    pub fn show(mut self, ui: &mut Ui) -> Option<Hovered> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let origin = rect.min.to_vec2();
        let to_canvas = |p: Pos2| p - origin;
        let to_screen = |x: f32, y: f32| Pos2::new(x, y) + origin;

        let viewport = Viewport::new(rect.width(), rect.height());
        if self.graph.viewport() != viewport {
            self.graph.set_viewport(viewport);
        }

        // Drag: pin on start, follow the pointer, release keeps the pin.
        if response.drag_started() {
            let press = ui.input(|i| i.pointer.press_origin()).map(to_canvas);
            if press.is_some_and(|p| self.state.begin_drag(self.graph, p)) {
                self.layout.restart();
            }
        }
        if response.dragged() {
            let pointer = response.interact_pointer_pos().map(to_canvas);
            if pointer.is_some_and(|p| self.state.drag_to(self.graph, p)) {
                self.layout.restart();
            }
        }
        if response.drag_stopped() {
            self.state.end_drag();
        }

        if response.double_clicked() {
            let hit = response.interact_pointer_pos().and_then(|p| pick(self.graph, to_canvas(p)));
            if let Some(Hovered::Node(index)) = hit {
                debug!(target: "graph_view", node = %self.graph.nodes[index].key(), "Unpinning node");
                self.graph.set_fixed(index, false);
                self.layout.restart();
            }
        }

        if self.layout.tick(self.graph) {
            ui.ctx().request_repaint();
        }

        let painter = painter.with_clip_rect(rect);
        for link in &self.graph.links {
            let (a, b) = (&self.graph.nodes[link.source], &self.graph.nodes[link.target]);
            edge_shape::paint_link(&painter, to_screen(a.x, a.y), to_screen(b.x, b.y), link);
        }
        for entity in [Entity::Enb, Entity::Ue] {
            for node in self.graph.nodes.iter().filter(|node| node.entity == entity) {
                let Some(element) = self.scene.element(node.id) else {
                    continue;
                };
                let center = to_screen(node.x, node.y);
                let opacity = element.fade_in();
                match entity {
                    Entity::Enb => node_shape::paint_enb(&painter, center, opacity),
                    _ => node_shape::paint_ue(&painter, center, element.fill, opacity),
                }
            }
        }
        if self.scene.is_animating() {
            ui.ctx().request_repaint();
        }

        let pointer = response.hover_pos();
        let hovered = pointer.and_then(|p| pick(self.graph, to_canvas(p)));
        self.show_tooltip(ui, hovered, pointer);
        hovered
    }

    fn show_tooltip(&mut self, ui: &Ui, hovered: Option<Hovered>, pointer: Option<Pos2>) {
        let (Some(hovered), Some(pointer)) = (hovered, pointer) else {
            self.state.hover = None;
            return;
        };

        let Some(key) = hover_key(self.graph, hovered) else {
            self.state.hover = None;
            return;
        };
        let since = match self.state.hover {
            Some((current, since)) if current == key => Some(since),
            _ => None,
        };
        let since = since.unwrap_or_else(|| {
            let now = Instant::now();
            self.state.hover = Some((key, now));
            now
        });
        let fade = (since.elapsed().as_secs_f32() / TOOLTIP_FADE.as_secs_f32()).min(1.0);
        if fade < 1.0 {
            ui.ctx().request_repaint();
        }

        let lines = match hovered {
            Hovered::Node(index) => node_tooltip(&self.graph.nodes[index]),
            Hovered::Link(index) => link_tooltip(&self.graph.links[index]),
        };
        FloatingTooltip::new(Id::new("graph_hover_tooltip"), pointer)
            .opacity(fade)
            .show(ui.ctx(), |ui| line_list(ui, lines));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::snapshot::Snapshot;

    fn fixture_graph() -> NetworkGraph {
        let snapshot: Snapshot =
            serde_json::from_str(include_str!("../../test_data/snapshot.json")).unwrap();
        let mut graph = NetworkGraph::new(Viewport::new(1130.0, 750.0));
        graph.reconcile(snapshot.graph_data);
        graph
    }

    #[test]
    fn test_pick_prefers_ue_over_enb() {
        let mut graph = fixture_graph();
        let (x, y) = (graph.nodes[0].x, graph.nodes[0].y);
        graph.nodes[2].x = x + 10.0;
        graph.nodes[2].y = y;
        assert_eq!(pick(&graph, Pos2::new(x + 10.0, y)), Some(Hovered::Node(2)));
        assert_eq!(pick(&graph, Pos2::new(x - 20.0, y)), Some(Hovered::Node(0)));
    }

    #[test]
    fn test_pick_link_between_nodes() {
        let graph = fixture_graph();
        let link = &graph.links[2];
        let (a, b) = (&graph.nodes[link.source], &graph.nodes[link.target]);
        let mid = Pos2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        assert_eq!(pick(&graph, mid), Some(Hovered::Link(2)));
        assert_eq!(pick(&graph, Pos2::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_drag_pins_and_clamps() {
        let mut graph = fixture_graph();
        graph.set_fixed(3, false);
        drag_node(&mut graph, 3, Pos2::new(2000.0, -5.0));
        let node = &graph.nodes[3];
        assert!(node.fixed);
        assert_eq!((node.x, node.y), (1130.0, 0.0));
    }

    #[test]
    fn test_drag_out_of_range_is_ignored() {
        let mut graph = fixture_graph();
        let before = graph.nodes.clone();
        drag_node(&mut graph, 99, Pos2::new(1.0, 1.0));
        assert_eq!(graph.nodes, before);
    }

    fn twin_graph() -> NetworkGraph {
        let data = serde_json::from_value(serde_json::json!({"nodes": [
            {"id": 0, "node_id": 9, "vbs_id": "v", "entity": "ue", "x": 100, "y": 650},
            {"id": 1, "node_id": 9, "vbs_id": "v", "entity": "ue", "x": 500, "y": 650}
        ]}))
        .unwrap();
        let mut graph = NetworkGraph::new(Viewport::new(1130.0, 750.0));
        graph.reconcile(data);
        graph
    }

    #[test]
    fn test_drag_moves_the_grabbed_twin() {
        let mut graph = twin_graph();
        let mut state = InteractionState::default();
        assert!(state.begin_drag(&mut graph, Pos2::new(500.0, 100.0)));
        assert!(state.drag_to(&mut graph, Pos2::new(600.0, 300.0)));
        assert_eq!((graph.nodes[0].x, graph.nodes[0].y), (100.0, 100.0));
        assert_eq!((graph.nodes[1].x, graph.nodes[1].y), (600.0, 300.0));

        // A poll in the middle of the drag keeps the same copy grabbed.
        graph.reconcile(
            serde_json::from_value(serde_json::json!({"nodes": [
                {"id": 7, "node_id": 9, "vbs_id": "v", "entity": "ue", "x": 100, "y": 650},
                {"id": 8, "node_id": 9, "vbs_id": "v", "entity": "ue", "x": 500, "y": 650}
            ]}))
            .unwrap(),
        );
        assert!(state.drag_to(&mut graph, Pos2::new(700.0, 200.0)));
        assert_eq!((graph.nodes[0].x, graph.nodes[0].y), (100.0, 100.0));
        assert_eq!((graph.nodes[1].x, graph.nodes[1].y), (700.0, 200.0));

        state.end_drag();
        assert!(!state.drag_to(&mut graph, Pos2::new(10.0, 10.0)));
    }

    #[test]
    fn test_press_on_empty_canvas_grabs_nothing() {
        let mut graph = twin_graph();
        let mut state = InteractionState::default();
        assert!(!state.begin_drag(&mut graph, Pos2::new(1000.0, 700.0)));
        assert!(!state.drag_to(&mut graph, Pos2::new(1.0, 1.0)));
    }

    #[test]
    fn test_hover_keys_tell_twins_apart() {
        let graph = twin_graph();
        assert_ne!(
            hover_key(&graph, Hovered::Node(0)),
            hover_key(&graph, Hovered::Node(1))
        );
        assert_eq!(hover_key(&graph, Hovered::Link(0)), None);
    }
}
