pub mod node;
pub mod tree;
pub mod unit_tests;

pub use node::{Key, Node, NodeId, NodeKind};
pub use tree::{BPlusTree, Lookup};
