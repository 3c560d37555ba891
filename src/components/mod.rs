//! Reusable view components.

pub mod flow_graph;
