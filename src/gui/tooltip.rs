use egui::{self, CollapsingHeader, Context, Frame, Id, Label, Order, Pos2, Response, Ui, Vec2};

use crate::network::{
    link::Link,
    node::{Entity, Node},
};

/// A small floating panel anchored near the pointer.
///
/// Content is supplied by the caller.
///
/// Example (conceptual):
/// let id = egui::Id::new("hover_tooltip");
/// FloatingTooltip::new(id, pointer)
///     .opacity(fade)
///     .show(ctx, |ui| line_list(ui, node_tooltip(node)));
#[derive(Debug, Clone)]
pub struct FloatingTooltip {
    id: Id,
    anchor: Pos2,
    options: TooltipOptions,
}

#[derive(Debug, Clone)]
pub struct TooltipOptions {
    /// Offset applied to the anchor; positive y moves downward.
    pub offset: Vec2,
    pub min_width: f32,
    pub order: Order,
    pub opacity: f32,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            // Right of and slightly above the pointer
            offset: Vec2 { x: 18.0, y: -28.0 },
            min_width: 60.0,
            order: Order::Tooltip,
            opacity: 0.9,
        }
    }
}

impl FloatingTooltip {
    pub fn new(id: Id, anchor: Pos2) -> Self {
        Self {
            id,
            anchor,
            options: TooltipOptions::default(),
        }
    }

    /// Scale the resting opacity, e.g. by a fade-in factor.
    pub fn opacity(mut self, factor: f32) -> Self {
        self.options.opacity *= factor.clamp(0.0, 1.0);
        self
    }

    pub fn show(&self, ctx: &Context, add_contents: impl FnOnce(&mut Ui)) -> Response {
        let pos = self.anchor + self.options.offset;
        egui::Area::new(self.id)
            .order(self.options.order)
            .interactable(false)
            .constrain(true)
            .fixed_pos(pos)
            .show(ctx, |ui| {
                ui.set_opacity(self.options.opacity);
                Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(self.options.min_width);
                    add_contents(ui);
                });
            })
            .response
    }
}

fn measurement(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

pub fn link_tooltip(link: &Link) -> Vec<String> {
    vec![
        format!("RSRP: {}", measurement(link.rsrp)),
        format!("RSRQ: {}", measurement(link.rsrq)),
    ]
}

/// eNB id, then either the cell list or per-cell utilization.
pub fn enb_tooltip(node: &Node) -> Vec<String> {
    let mut lines = vec![format!("eNB Id: {}", node.node_id)];
    if !node.has_stats() {
        let cells: Vec<String> = node.cells.iter().map(ToString::to_string).collect();
        lines.push(format!("{}: {}", node.tooltip, cells.join(",")));
        return lines;
    }

    let mut cells: Vec<_> = node.stats.iter().collect();
    cells.sort_by(|(a, _), (b, _)| cell_order(a).cmp(&cell_order(b)).then_with(|| a.cmp(b)));
    for (cell, stats) in cells {
        lines.push(format!("{}: {}", node.tooltip, cell));
        if let Some(stats) = stats {
            if let Some(dl) = stats.dl {
                lines.push(format!("DL: {:.2}%", dl));
            }
            if let Some(ul) = stats.ul {
                lines.push(format!("UL: {:.2}%", ul));
            }
        }
    }
    lines
}

// Numeric cell ids in numeric order, anything else after them
fn cell_order(cell: &str) -> (bool, u64) {
    match cell.parse::<u64>() {
        Ok(n) => (false, n),
        Err(_) => (true, 0),
    }
}

pub fn ue_tooltip(node: &Node) -> Vec<String> {
    vec![format!("{}: {}", node.tooltip, node.node_id)]
}

pub fn node_tooltip(node: &Node) -> Vec<String> {
    match node.entity {
        Entity::Enb => enb_tooltip(node),
        Entity::Ue => ue_tooltip(node),
        Entity::Other => Vec::new(),
    }
}

/// Render a collapsible section with a grouped frame.
pub fn collapsible_section(
    ui: &mut Ui,
    title: impl Into<egui::WidgetText>,
    default_open: bool,
    add_contents: impl FnOnce(&mut Ui),
) {
    CollapsingHeader::new(title)
        .default_open(default_open)
        .show(ui, |ui| {
            Frame::group(ui.style()).show(ui, |ui| {
                add_contents(ui);
            });
        });
}

pub fn label_no_wrap(text: impl Into<egui::WidgetText>) -> Label {
    Label::new(text).wrap_mode(egui::TextWrapMode::Extend)
}

/// Plain stacked lines, as used for hover tooltips.
pub fn line_list<I, S>(ui: &mut Ui, items: I)
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    for s in items {
        ui.add(label_no_wrap(s.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::network_graph::{NetworkGraph, Viewport};
    use crate::topology::snapshot::Snapshot;

    fn fixture_graph() -> NetworkGraph {
        let snapshot: Snapshot =
            serde_json::from_str(include_str!("../../test_data/snapshot.json")).unwrap();
        let mut graph = NetworkGraph::new(Viewport::new(1130.0, 750.0));
        graph.reconcile(snapshot.graph_data);
        graph
    }

    #[test]
    fn test_enb_with_stats() {
        let graph = fixture_graph();
        assert_eq!(
            enb_tooltip(&graph.nodes[0]),
            vec!["eNB Id: 1", "PCI: 1", "DL: 42.00%", "UL: 7.50%", "PCI: 2", "DL: 3.10%"]
        );
    }

    #[test]
    fn test_enb_without_stats_lists_cells() {
        let graph = fixture_graph();
        assert_eq!(enb_tooltip(&graph.nodes[1]), vec!["eNB Id: 2", "PCI: 3"]);
    }

    #[test]
    fn test_ue_and_link() {
        let graph = fixture_graph();
        assert_eq!(node_tooltip(&graph.nodes[2]), vec!["RNTI: 70"]);
        assert_eq!(link_tooltip(&graph.links[0]), vec!["RSRP: -87", "RSRQ: -9"]);
    }

    #[test]
    fn test_missing_measurement() {
        let graph = fixture_graph();
        let mut link = graph.links[0].clone();
        link.rsrq = None;
        assert_eq!(link_tooltip(&link)[1], "RSRQ: n/a");
    }
}
