use crate::arena::Entry;

/// An enum representing the color of a node in a red black tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// A link to a child or parent. `None` is the sentinel.
pub type Link = Option<Entry>;

/// The side of a parent that a child hangs from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// The structural part of a node. The sentinel is a bare `Links` owned by the tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Links {
    pub color: Color,
    pub left: Link,
    pub right: Link,
    pub parent: Link,
}

impl Links {
    pub fn sentinel() -> Self {
        Links {
            color: Color::Black,
            left: None,
            right: None,
            parent: None,
        }
    }

    pub fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// A struct representing an internal node of a red black tree.
pub struct Node<T> {
    pub key: T,
    pub links: Links,
}

impl<T> Node<T> {
    /// A fresh red leaf hanging from `parent`.
    pub fn new(key: T, parent: Link) -> Self {
        Node {
            key,
            links: Links {
                color: Color::Red,
                left: None,
                right: None,
                parent,
            },
        }
    }
}

/// A handle to a key stored in a `RedBlackSet<T>`.
///
/// Handles are only meaningful to the set that issued them and only until the node they name
/// is erased. Passing a handle to any other set, or reusing it after the erase, is rejected.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeRef {
    pub(crate) tree_id: u64,
    pub(crate) entry: Entry,
}

#[cfg(test)]
mod tests {
    use super::{Color, Links, Node, Side};

    #[test]
    fn test_opposite() {
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite(), Side::Left);
    }

    #[test]
    fn test_sentinel_is_black_and_self_linked() {
        let sentinel = Links::sentinel();
        assert_eq!(sentinel.color, Color::Black);
        assert_eq!(sentinel.child(Side::Left), None);
        assert_eq!(sentinel.child(Side::Right), None);
        assert_eq!(sentinel.parent, None);
    }

    #[test]
    fn test_new_node_is_red_leaf() {
        let node = Node::new(1, None);
        assert_eq!(node.key, 1);
        assert_eq!(node.links.color, Color::Red);
        assert_eq!(node.links.left, None);
        assert_eq!(node.links.right, None);
    }
}
