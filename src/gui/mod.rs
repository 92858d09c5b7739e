pub mod app;
pub mod edge_shape;
pub mod graph_view;
pub mod node_shape;
pub mod param_panel;
pub mod scene;
pub mod tooltip;
