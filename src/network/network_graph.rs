use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::network::{
    link::{Link, WireLink},
    node::{Entity, Node, NodeKey, WireNode},
};

/// `graphData` of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<WireNode>,
    #[serde(default)]
    pub links: Vec<WireLink>,
}

/// Stable reference to a live node. Snapshots may repeat an identity key, so
/// the key's uuid is paired with the node's rank among equal keys. Reconcile
/// keeps nodes with equal keys in their relative order, so the rank holds
/// across polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub uuid: Uuid,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Outcome of one reconcile pass, keyed by node identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub created: Vec<NodeKey>,
    pub updated: Vec<NodeKey>,
    pub removed: Vec<NodeKey>,
    /// Links whose `src` or `dst` did not name a node of the snapshot.
    pub dropped_links: usize,
}

impl ReconcileReport {
    pub fn is_structural_change(&self) -> bool {
        !self.created.is_empty() || !self.removed.is_empty()
    }
}

/// The live topology shown on the canvas.
///
/// Nodes persist across polls by identity key (`node_id`, `entity`, `vbs_id`)
/// so that positions and pins survive; links are rebuilt every poll.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    viewport: Viewport,
}

impl NetworkGraph {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            viewport,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // Merge a fresh snapshot into the live graph.
    // - Each previous node consumes the first unconsumed fresh entry with the same key
    //   and keeps its position and pin
    // - Leftover fresh entries become new pinned nodes at the mirrored server estimate
    // - Previous nodes without a match are dropped
    // - Links are rebuilt against the new node list; dangling links are dropped
    pub fn reconcile(&mut self, fresh: GraphData) -> ReconcileReport {
        let GraphData {
            nodes: mut pool,
            links: wire_links,
        } = fresh;
        let previous = std::mem::take(&mut self.nodes);
        let mut report = ReconcileReport::default();
        let mut nodes = Vec::with_capacity(pool.len());

        for prev in previous.iter() {
            match pool.iter().position(|candidate| prev.matches(candidate)) {
                Some(pos) => {
                    let wire = pool.remove(pos);
                    report.updated.push(prev.key());
                    nodes.push(Node::carried_over(prev, wire));
                }
                None => report.removed.push(prev.key()),
            }
        }

        for wire in pool {
            report.created.push(wire.key());
            nodes.push(Node::new(wire, self.viewport.height));
        }

        self.nodes = nodes;
        report.dropped_links = self.rebuild_links(wire_links);

        debug!(
            target: "reconcile",
            created = report.created.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            links = self.links.len(),
            dropped_links = report.dropped_links,
            "Reconciled snapshot"
        );
        report
    }

    /// Replace all links, resolving surrogate ids against the current nodes.
    /// Returns how many links were dropped for naming an unknown node.
    fn rebuild_links(&mut self, wire_links: Vec<WireLink>) -> usize {
        let index_by_id: HashMap<u64, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect();

        self.links.clear();
        let mut dropped = 0;
        for wire in wire_links {
            match (index_by_id.get(&wire.src), index_by_id.get(&wire.dst)) {
                (Some(&source), Some(&target)) => self.links.push(Link::new(source, target, wire)),
                _ => {
                    trace!(target: "reconcile", src = wire.src, dst = wire.dst, "Dropping dangling link");
                    dropped += 1;
                }
            }
        }
        dropped
    }

    pub fn node_handle(&self, index: usize) -> Option<NodeHandle> {
        let key = self.nodes.get(index)?.key();
        let ordinal = self.nodes[..index].iter().filter(|node| node.key() == key).count();
        Some(NodeHandle { uuid: key.to_uuidv5(), ordinal })
    }

    /// Index of the node `handle` refers to, if it is still present.
    pub fn node_index(&self, handle: NodeHandle) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.key().to_uuidv5() == handle.uuid)
            .nth(handle.ordinal)
            .map(|(index, _)| index)
    }

    pub fn set_fixed(&mut self, index: usize, fixed: bool) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.fixed = fixed;
        }
    }

    pub fn count(&self, entity: Entity) -> usize {
        self.nodes.iter().filter(|node| node.entity == entity).count()
    }
}

impl Display for NetworkGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "NetworkGraph {{")?;
        for node in &self.nodes {
            writeln!(
                f,
                "\t[{}] {} at ({:.1}, {:.1}){}",
                node.id,
                node.key(),
                node.x,
                node.y,
                if node.fixed { " pinned" } else { "" }
            )?;
        }
        for link in &self.links {
            writeln!(
                f,
                "\t{} -> {} rsrp={:?} rsrq={:?}",
                self.nodes[link.source].id, self.nodes[link.target].id, link.rsrp, link.rsrq
            )?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::node::ScalarId;

    fn graph_data(json: &str) -> GraphData {
        serde_json::from_str(json).expect("Failed to deserialize graph data")
    }

    fn graph() -> NetworkGraph {
        NetworkGraph::new(Viewport::new(1130.0, 750.0))
    }

    #[test]
    fn test_matched_node_keeps_position_and_pin() {
        let mut graph = graph();
        graph.reconcile(graph_data(
            r#"{"nodes": [{"id": 0, "node_id": "A", "entity": "enb", "vbs_id": 1, "x": 5, "y": 5}], "links": []}"#,
        ));
        graph.nodes[0].x = 10.0;
        graph.nodes[0].y = 20.0;
        graph.nodes[0].fixed = true;

        let report = graph.reconcile(graph_data(
            r#"{"nodes": [{"id": 7, "node_id": "A", "entity": "enb", "vbs_id": 1, "x": 999, "y": 999,
                "tooltip": "t", "cells": [], "stats": {}}], "links": []}"#,
        ));

        assert_eq!(graph.nodes.len(), 1);
        let node = &graph.nodes[0];
        assert_eq!((node.x, node.y, node.fixed), (10.0, 20.0, true));
        assert_eq!(node.id, 7);
        assert_eq!(node.tooltip, "t");
        assert_eq!(report.updated.len(), 1);
        assert!(report.created.is_empty());
    }

    #[test]
    fn test_unpinned_state_is_carried() {
        let mut graph = graph();
        let snapshot = r#"{"nodes": [{"id": 0, "node_id": 3, "entity": "ue", "vbs_id": "v", "x": 5, "y": 5}]}"#;
        graph.reconcile(graph_data(snapshot));
        graph.set_fixed(0, false);
        graph.reconcile(graph_data(snapshot));
        assert!(!graph.nodes[0].fixed);
    }

    #[test]
    fn test_new_node_pinned_with_mirrored_y() {
        let mut graph = graph();
        let report = graph.reconcile(graph_data(
            r#"{"nodes": [{"id": 0, "node_id": 1, "entity": "enb", "vbs_id": "v", "x": 300, "y": 200}]}"#,
        ));
        let node = &graph.nodes[0];
        assert!(node.fixed);
        assert_eq!(node.x, 300.0);
        assert_eq!(node.y, 550.0);
        assert_eq!(report.created.len(), 1);
    }

    #[test]
    fn test_absent_node_is_removed() {
        let mut graph = graph();
        graph.reconcile(graph_data(
            r#"{"nodes": [
                {"id": 0, "node_id": 1, "entity": "enb", "vbs_id": "v"},
                {"id": 1, "node_id": 9, "entity": "ue", "vbs_id": "v"}
            ]}"#,
        ));
        let report = graph.reconcile(graph_data(
            r#"{"nodes": [{"id": 0, "node_id": 1, "entity": "enb", "vbs_id": "v"}]}"#,
        ));
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].entity, Entity::Enb);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].node_id, ScalarId::Int(9));
    }

    #[test]
    fn test_entity_is_part_of_identity() {
        let mut graph = graph();
        graph.reconcile(graph_data(
            r#"{"nodes": [{"id": 0, "node_id": 1, "entity": "enb", "vbs_id": "v", "x": 1, "y": 1}]}"#,
        ));
        graph.nodes[0].x = 42.0;
        let report = graph.reconcile(graph_data(
            r#"{"nodes": [{"id": 0, "node_id": 1, "entity": "ue", "vbs_id": "v", "x": 1, "y": 1}]}"#,
        ));
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(graph.nodes[0].x, 1.0);
    }

    #[test]
    fn test_duplicate_keys_surface_as_new_nodes() {
        let mut graph = graph();
        graph.reconcile(graph_data(
            r#"{"nodes": [{"id": 0, "node_id": 1, "entity": "ue", "vbs_id": "v", "x": 1, "y": 1}]}"#,
        ));
        graph.nodes[0].x = 77.0;
        let report = graph.reconcile(graph_data(
            r#"{"nodes": [
                {"id": 0, "node_id": 1, "entity": "ue", "vbs_id": "v", "x": 1, "y": 1},
                {"id": 1, "node_id": 1, "entity": "ue", "vbs_id": "v", "x": 2, "y": 2}
            ]}"#,
        ));
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].x, 77.0);
        assert_eq!(graph.nodes[0].id, 0);
        assert_eq!(graph.nodes[1].id, 1);
        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.created.len(), 1);
    }

    #[test]
    fn test_dangling_links_are_dropped() {
        let mut graph = graph();
        let report = graph.reconcile(graph_data(
            r#"{"nodes": [
                {"id": 0, "node_id": 1, "entity": "enb", "vbs_id": "v"},
                {"id": 1, "node_id": 9, "entity": "ue", "vbs_id": "v"}
            ], "links": [
                {"src": 0, "dst": 1, "rsrp": -90, "rsrq": -8, "color": "orange", "width": 6},
                {"src": 0, "dst": 42, "rsrp": -90, "rsrq": -8, "color": "black", "width": 4},
                {"src": 17, "dst": 1, "rsrp": -90, "rsrq": -8, "color": "black", "width": 4}
            ]}"#,
        ));
        assert_eq!(graph.links.len(), 1);
        assert_eq!(report.dropped_links, 2);
        let link = &graph.links[0];
        assert_eq!(graph.nodes[link.source].id, 0);
        assert_eq!(graph.nodes[link.target].id, 1);
    }

    #[test]
    fn test_links_follow_surrogate_ids_after_reorder() {
        let mut graph = graph();
        graph.reconcile(graph_data(
            r#"{"nodes": [
                {"id": 0, "node_id": 1, "entity": "enb", "vbs_id": "v"},
                {"id": 1, "node_id": 9, "entity": "ue", "vbs_id": "v"}
            ]}"#,
        ));
        // Same nodes, surrogate ids swapped by the controller.
        graph.reconcile(graph_data(
            r#"{"nodes": [
                {"id": 1, "node_id": 1, "entity": "enb", "vbs_id": "v"},
                {"id": 0, "node_id": 9, "entity": "ue", "vbs_id": "v"}
            ], "links": [{"src": 1, "dst": 0, "color": "orange", "width": 6}]}"#,
        ));
        let link = &graph.links[0];
        assert_eq!(graph.nodes[link.source].entity, Entity::Enb);
        assert_eq!(graph.nodes[link.target].entity, Entity::Ue);
    }

    #[test]
    fn test_identical_polls_are_stable() {
        let json = include_str!("../../test_data/snapshot.json");
        let snapshot: serde_json::Value = serde_json::from_str(json).unwrap();
        let data: GraphData = serde_json::from_value(snapshot["graphData"].clone()).unwrap();

        let mut graph = graph();
        graph.reconcile(data.clone());
        let first = graph.nodes.clone();
        let first_links = graph.links.clone();
        let report = graph.reconcile(data);

        assert_eq!(graph.nodes, first);
        assert_eq!(graph.links, first_links);
        assert!(!report.is_structural_change());
    }

    #[test]
    fn test_handle_survives_reorder() {
        let mut graph = graph();
        graph.reconcile(graph_data(
            r#"{"nodes": [
                {"id": 0, "node_id": 1, "entity": "enb", "vbs_id": "v"},
                {"id": 1, "node_id": 9, "entity": "ue", "vbs_id": "v"}
            ]}"#,
        ));
        let ue = graph.node_handle(1).expect("UE should be present");
        graph.reconcile(graph_data(
            r#"{"nodes": [
                {"id": 4, "node_id": 2, "entity": "enb", "vbs_id": "v"},
                {"id": 5, "node_id": 9, "entity": "ue", "vbs_id": "v"}
            ]}"#,
        ));
        let index = graph.node_index(ue).expect("UE should still be present");
        assert_eq!(graph.nodes[index].id, 5);
        assert_eq!(graph.node_index(NodeHandle { uuid: Uuid::nil(), ordinal: 0 }), None);
        assert_eq!(graph.node_handle(99), None);
    }

    #[test]
    fn test_handles_tell_duplicate_keys_apart() {
        let mut graph = graph();
        let twins = r#"{"nodes": [
            {"id": 0, "node_id": 9, "entity": "ue", "vbs_id": "v", "x": 100, "y": 650},
            {"id": 1, "node_id": 9, "entity": "ue", "vbs_id": "v", "x": 500, "y": 650}
        ]}"#;
        graph.reconcile(graph_data(twins));
        let second = graph.node_handle(1).expect("second copy should be present");
        assert_eq!(second.ordinal, 1);
        assert_eq!(graph.node_index(second), Some(1));

        graph.nodes[1].x = 520.0;
        graph.reconcile(graph_data(twins));
        let index = graph.node_index(second).expect("second copy should survive the poll");
        assert_eq!(graph.nodes[index].x, 520.0);
        assert_eq!(graph.nodes[0].x, 100.0);

        let gone = NodeHandle { ordinal: 2, ..second };
        assert_eq!(graph.node_index(gone), None);
    }
}
