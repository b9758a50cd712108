//! Roadmap data structures: configurations, connectivity, shortest paths and
//! the sparse spanner.

pub mod disjoint_sets;
pub mod roadmap;
pub mod shortest_path;
pub mod sparse;

pub use disjoint_sets::DisjointSets;
pub use roadmap::{Configuration, Edge, Roadmap};
pub use shortest_path::{astar, dijkstra, ShortestPaths};
pub use sparse::{Admission, SparseGraph, SparseGraphConfig};
