//! Balanced tree partitioning.
//!
//! A signature dynamic program cuts a rooted tree into components whose
//! sizes fall into geometric size classes; a bin packer then assembles the
//! components into at most `k` parts of bounded size. General graphs are
//! partitioned along one of their spanning trees.

pub mod arena;
pub mod cli;
pub mod config;
pub mod cut;
pub mod errors;
pub mod exitcode;
pub mod generate;
pub mod graph;
pub mod io;
pub mod level_tree;
pub mod pack;
pub mod partition;
pub mod rational;
pub mod tree_traits;
pub mod util;

pub use arena::RootedTree;
pub use cut::{Signature, SignatureTable};
pub use errors::{FormatError, GenerateError, GraphError, PartitionError, RationalError, SettingsError};
pub use generate::GraphGenerator;
pub use graph::{Graph, NodeId, SpanningTree, Weight};
pub use partition::{partition_graph, partition_tree, Partition};
