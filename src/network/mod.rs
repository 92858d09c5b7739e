/*
 * This module defines the graph model the GUI renders: nodes, links, and the
 * reconciliation that merges each polled snapshot into the live graph.
 */

pub mod node;
pub mod link;
pub mod network_graph;
