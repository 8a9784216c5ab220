//! Static views of a built graph.
pub mod topology;
