//! Self-balancing binary search tree that uses a color bit to ensure that the tree remains
//! approximately balanced during insertions and deletions.
//!
//! Nodes are stored in a generational arena and every empty child is represented by a single
//! shared black sentinel. Callers address nodes through `NodeRef` handles, which are checked
//! against the owning tree and the node's generation before any structural change.

mod config;
mod node;
mod set;
mod tree;
mod validate;

pub use self::config::Config;
pub use self::node::NodeRef;
pub use self::set::RedBlackSet;
pub use self::validate::InvariantViolation;

use std::collections::TryReserveError;
use std::error;
use std::fmt;
use std::result;

/// Convenience `Error` enum for `red_black_tree`.
#[derive(Debug)]
pub enum Error {
    /// Memory for a node or for the initial capacity could not be reserved.
    AllocError(TryReserveError),
    /// The handle was issued by a different tree.
    ForeignNode,
    /// The handle refers to a node that has already been erased.
    StaleNode,
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Error {
        Error::AllocError(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::AllocError(error) => Some(error),
            Error::ForeignNode | Error::StaleNode => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AllocError(error) => write!(f, "allocation failed: {}", error),
            Error::ForeignNode => write!(f, "node handle belongs to another tree"),
            Error::StaleNode => write!(f, "node handle refers to an erased node"),
        }
    }
}

/// Convenience `Result` type for `red_black_tree`.
pub type Result<T> = result::Result<T, Error>;
