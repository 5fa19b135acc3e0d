//! The per-audio-unit device graph: a DAG of processors connected by typed
//! ports, rendered in topological order once per chunk (§3, §4.3).

pub mod device_graph;
pub mod port;

pub use device_graph::DeviceGraph;
pub use port::{Edge, PortKind, MASTER};
