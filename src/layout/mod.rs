//! Force-directed placement of the graph nodes.

pub mod force;

pub use force::{ForceLayout, ForceParams};
