#[macro_use]
extern crate error_chain;

pub mod data_structure;

pub use data_structure::skiplist;
pub use data_structure::skiplist::{DataRef, Key, Node, NodeIdx, SkipList};
