use crate::red_black_tree::config::Config;
use crate::red_black_tree::node::{Link, NodeRef};
use crate::red_black_tree::tree::Tree;
use crate::red_black_tree::validate::{self, InvariantViolation};
use crate::red_black_tree::{Error, Result};
use log::{debug, error, warn};
use std::borrow::Borrow;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

fn next_tree_id() -> u64 {
    NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed)
}

/// An ordered set implemented using a red black tree.
///
/// A red black tree is a self-balancing binary search tree where every node is colored red or
/// black, no red node has a red child, and every path from a node down to an empty child
/// crosses the same number of black nodes. Together these keep the height logarithmic in the
/// number of keys.
///
/// Keys that compare equal are all kept: a new key is placed after every key equal to it.
/// Insertion hands back a `NodeRef` that can later be passed to `erase`.
///
/// # Examples
///
/// ```
/// use rb_set::red_black_tree::RedBlackSet;
///
/// let mut set = RedBlackSet::new();
/// set.insert(0).unwrap();
/// let three = set.insert(3).unwrap();
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.min().and_then(|node| set.get(node)), Some(&0));
///
/// assert_eq!(set.erase(three).unwrap(), 3);
/// assert!(set.erase(three).is_err());
/// assert_eq!(set.to_vec(), vec![0]);
/// ```
pub struct RedBlackSet<T> {
    id: u64,
    tree: Tree<T>,
    verify_invariants: bool,
}

impl<T> RedBlackSet<T> {
    /// Constructs a new, empty `RedBlackSet<T>`. No memory is allocated until the first key is
    /// inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let set: RedBlackSet<u32> = RedBlackSet::new();
    /// ```
    pub fn new() -> Self {
        let config = Config::default();
        RedBlackSet {
            id: next_tree_id(),
            tree: Tree::new(config.chunk_size),
            verify_invariants: config.verify_invariants,
        }
    }

    /// Constructs a new, empty `RedBlackSet<T>` from a `Config`, reserving room for
    /// `config.initial_capacity` keys. Returns an error if that memory could not be reserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::{Config, RedBlackSet};
    ///
    /// let config = Config {
    ///     verify_invariants: true,
    ///     ..Config::default()
    /// };
    /// let mut set = RedBlackSet::with_config(config).unwrap();
    /// set.insert(1).unwrap();
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        let tree = Tree::with_capacity(config.chunk_size, config.initial_capacity)?;
        let id = next_tree_id();
        debug!(
            "created red black set {} with capacity {}",
            id,
            tree.arena.capacity()
        );
        Ok(RedBlackSet {
            id,
            tree,
            verify_invariants: config.verify_invariants,
        })
    }

    /// Constructs a new, empty `RedBlackSet<T>` with room for at least `capacity` keys.
    /// Returns an error if that memory could not be reserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let set: RedBlackSet<u32> = RedBlackSet::with_capacity(1024).unwrap();
    /// assert!(set.is_empty());
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        RedBlackSet::with_config(Config {
            initial_capacity: capacity,
            ..Config::default()
        })
    }

    fn check(&self, node: NodeRef) -> Result<()> {
        if node.tree_id != self.id {
            warn!("rejected handle from tree {} in tree {}", node.tree_id, self.id);
            return Err(Error::ForeignNode);
        }
        if !self.tree.arena.contains(&node.entry) {
            warn!("rejected stale handle {:?} in tree {}", node.entry, self.id);
            return Err(Error::StaleNode);
        }
        Ok(())
    }

    fn verify(&self, operation: &str)
    where
        T: Ord,
    {
        if !self.verify_invariants {
            return;
        }
        if let Err(violation) = validate::validate(&self.tree) {
            error!("invariant violated after {} in tree {}: {}", operation, self.id, violation);
            panic!("Invariant violated after {}: {}.", operation, violation);
        }
    }

    fn node_ref(&self, link: Link) -> Option<NodeRef> {
        link.map(|entry| NodeRef {
            tree_id: self.id,
            entry,
        })
    }

    /// Inserts a key into the set and returns a handle to its node. A key equal to one already
    /// in the set is kept as well and ordered after it. Returns an error if memory for the node
    /// could not be allocated, in which case the set is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// let node = set.insert(1).unwrap();
    /// assert_eq!(set.get(node), Some(&1));
    /// set.insert(1).unwrap();
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn insert(&mut self, key: T) -> Result<NodeRef>
    where
        T: Ord,
    {
        let entry = self.tree.insert(key)?;
        self.verify("insert");
        Ok(NodeRef {
            tree_id: self.id,
            entry,
        })
    }

    /// Removes the node behind `node` and returns its key. Returns `Error::ForeignNode` if the
    /// handle was issued by another set and `Error::StaleNode` if its node was already erased.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::{Error, RedBlackSet};
    ///
    /// let mut set = RedBlackSet::new();
    /// let node = set.insert(1).unwrap();
    /// assert_eq!(set.erase(node).unwrap(), 1);
    ///
    /// match set.erase(node) {
    ///     Err(Error::StaleNode) => {},
    ///     _ => panic!(),
    /// }
    /// ```
    pub fn erase(&mut self, node: NodeRef) -> Result<T>
    where
        T: Ord,
    {
        self.check(node)?;
        let key = self.tree.erase(node.entry);
        self.verify("erase");
        Ok(key)
    }

    /// Removes a key equal to `key` from the set and returns it. Returns `None` if no such key
    /// exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.remove(&1), Some(1));
    /// assert_eq!(set.remove(&1), None);
    /// ```
    pub fn remove<V>(&mut self, key: &V) -> Option<T>
    where
        T: Borrow<V> + Ord,
        V: Ord + ?Sized,
    {
        let entry = self.tree.find(key)?;
        let key = self.tree.erase(entry);
        self.verify("erase");
        Some(key)
    }

    /// Returns a handle to a node whose key is equal to `key`, or `None` if no such key exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// let node = set.insert(1).unwrap();
    /// assert_eq!(set.find(&1), Some(node));
    /// assert_eq!(set.find(&2), None);
    /// ```
    pub fn find<V>(&self, key: &V) -> Option<NodeRef>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.node_ref(self.tree.find(key))
    }

    /// Checks if a key exists in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1).unwrap();
    /// assert!(!set.contains(&0));
    /// assert!(set.contains(&1));
    /// ```
    pub fn contains<V>(&self, key: &V) -> bool
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.tree.find(key).is_some()
    }

    /// Returns the key behind `node`, or `None` if the handle is foreign or stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// let mut other = RedBlackSet::new();
    /// let node = set.insert(1).unwrap();
    /// let foreign = other.insert(1).unwrap();
    ///
    /// assert_eq!(set.get(node), Some(&1));
    /// assert_eq!(set.get(foreign), None);
    ///
    /// set.erase(node).unwrap();
    /// assert_eq!(set.get(node), None);
    /// ```
    pub fn get(&self, node: NodeRef) -> Option<&T> {
        if node.tree_id != self.id {
            return None;
        }
        self.tree.arena.get(&node.entry).map(|node| &node.key)
    }

    /// Returns a handle to the node with the minimum key. Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// assert_eq!(set.min(), None);
    /// set.insert(3).unwrap();
    /// let one = set.insert(1).unwrap();
    /// assert_eq!(set.min(), Some(one));
    /// ```
    pub fn min(&self) -> Option<NodeRef> {
        self.node_ref(self.tree.min_from(self.tree.root))
    }

    /// Returns a handle to the node with the maximum key. Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// assert_eq!(set.max(), None);
    /// set.insert(1).unwrap();
    /// let three = set.insert(3).unwrap();
    /// assert_eq!(set.max(), Some(three));
    /// ```
    pub fn max(&self) -> Option<NodeRef> {
        self.node_ref(self.tree.max_from(self.tree.root))
    }

    /// Copies keys in ascending order into `dest` until either the set or `dest` is exhausted,
    /// and returns the number of keys written.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// for key in &[5, 3, 8, 1] {
    ///     set.insert(*key).unwrap();
    /// }
    ///
    /// let mut dest = [0; 3];
    /// assert_eq!(set.export_ordered(&mut dest), 3);
    /// assert_eq!(dest, [1, 3, 5]);
    /// ```
    pub fn export_ordered(&self, dest: &mut [T]) -> usize
    where
        T: Clone,
    {
        let mut written = 0;
        self.tree.walk_inorder(|key| {
            if written == dest.len() {
                return false;
            }
            dest[written] = key.clone();
            written += 1;
            true
        });
        written
    }

    /// Returns every key of the set in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(3).unwrap();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.to_vec(), vec![1, 3]);
    /// ```
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut ret = Vec::with_capacity(self.len());
        self.tree.walk_inorder(|key| {
            ret.push(key.clone());
            true
        });
        ret
    }

    /// Returns the number of keys in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let set: RedBlackSet<u32> = RedBlackSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the set, releasing every node. Handles issued before the call become stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// let node = set.insert(1).unwrap();
    /// set.insert(2).unwrap();
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert_eq!(set.get(node), None);
    /// ```
    pub fn clear(&mut self) {
        let released = self.tree.clear();
        debug!("released {} nodes from tree {}", released, self.id);
    }

    /// Checks every red black tree invariant and returns the black height of the tree, counted
    /// from the root down to but excluding the sentinel.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_set::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// assert_eq!(set.validate(), Ok(0));
    /// set.insert(1).unwrap();
    /// assert_eq!(set.validate(), Ok(1));
    /// ```
    pub fn validate(&self) -> std::result::Result<usize, InvariantViolation>
    where
        T: Ord,
    {
        validate::validate(&self.tree)
    }
}

impl<T> Drop for RedBlackSet<T> {
    fn drop(&mut self) {
        if !self.is_empty() {
            self.clear();
        }
    }
}

impl<T> Default for RedBlackSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
