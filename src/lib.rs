//! An ordered key set backed by a red black tree.
//!
//! Nodes live in a generational arena and every empty child is a single shared black sentinel,
//! which keeps the rotation and rebalancing code free of special cases for missing children.

pub mod arena;
pub mod red_black_tree;

pub use crate::red_black_tree::RedBlackSet;
