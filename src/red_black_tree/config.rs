use serde_derive::{Deserialize, Serialize};

/// Construction settings for a `RedBlackSet<T>`.
///
/// Every field has a default, so a partial configuration deserializes cleanly.
///
/// # Examples
///
/// ```
/// use rb_set::red_black_tree::{Config, RedBlackSet};
///
/// let config = Config {
///     initial_capacity: 128,
///     ..Config::default()
/// };
/// let set: RedBlackSet<u32> = RedBlackSet::with_config(config).unwrap();
/// assert!(set.is_empty());
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Number of node slots reserved each time the node arena fills up.
    pub chunk_size: usize,
    /// Number of node slots reserved up front.
    pub initial_capacity: usize,
    /// Check every invariant after each insert and erase, panicking on a violation.
    pub verify_invariants: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_size: 64,
            initial_capacity: 0,
            verify_invariants: false,
        }
    }
}
