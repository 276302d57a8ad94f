use crate::arena::{Entry, TypedArena};
use crate::red_black_tree::node::{Color, Link, Links, Node, Side};
use log::trace;
use std::borrow::Borrow;
use std::collections::TryReserveError;
use std::cmp::Ordering;

/// The node arena, the root link and the sentinel of a red black tree.
///
/// Every link that reads `None` resolves to `nil`. Fixups may write the sentinel's parent, so
/// it is restored after each erase.
pub struct Tree<T> {
    pub arena: TypedArena<Node<T>>,
    pub root: Link,
    nil: Links,
}

impl<T> Tree<T> {
    pub fn new(chunk_size: usize) -> Self {
        Tree {
            arena: TypedArena::new(chunk_size),
            root: None,
            nil: Links::sentinel(),
        }
    }

    pub fn with_capacity(chunk_size: usize, capacity: usize) -> Result<Self, TryReserveError> {
        Ok(Tree {
            arena: TypedArena::with_capacity(chunk_size, capacity)?,
            root: None,
            nil: Links::sentinel(),
        })
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn sentinel(&self) -> &Links {
        &self.nil
    }

    pub fn links(&self, link: Link) -> &Links {
        match link {
            Some(entry) => &self.arena[entry].links,
            None => &self.nil,
        }
    }

    fn links_mut(&mut self, link: Link) -> &mut Links {
        match link {
            Some(entry) => &mut self.arena[entry].links,
            None => &mut self.nil,
        }
    }

    pub fn key(&self, entry: Entry) -> &T {
        &self.arena[entry].key
    }

    pub fn color(&self, link: Link) -> Color {
        self.links(link).color
    }

    fn set_color(&mut self, link: Link, color: Color) {
        debug_assert!(link.is_some() || color == Color::Black);
        self.links_mut(link).color = color;
    }

    pub fn parent(&self, link: Link) -> Link {
        self.links(link).parent
    }

    pub fn child(&self, link: Link, side: Side) -> Link {
        self.links(link).child(side)
    }

    fn set_child(&mut self, link: Link, side: Side, child: Link) {
        *self.links_mut(link).child_mut(side) = child;
    }

    fn set_parent(&mut self, link: Link, parent: Link) {
        self.links_mut(link).parent = parent;
    }

    // `link` must hang from a real parent.
    fn side_of(&self, link: Link) -> Side {
        if link == self.child(self.parent(link), Side::Left) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Points the slot of `parent` that currently holds `old` at `new`. A sentinel parent
    /// means `old` is the root.
    fn replace_child(&mut self, parent: Link, old: Link, new: Link) {
        if parent.is_none() {
            self.root = new;
        } else if old == self.child(parent, Side::Left) {
            self.set_child(parent, Side::Left, new);
        } else {
            self.set_child(parent, Side::Right, new);
        }
    }

    /// Rotates `pivot` down towards `side`, promoting its child on the opposite side into its
    /// place. The promoted child must be a real node.
    pub fn rotate(&mut self, pivot: Link, side: Side) {
        let other = side.opposite();
        let child = self.child(pivot, other);
        debug_assert!(child.is_some());

        let inner = self.child(child, side);
        self.set_child(pivot, other, inner);
        if inner.is_some() {
            self.set_parent(inner, pivot);
        }

        let parent = self.parent(pivot);
        self.set_parent(child, parent);
        self.replace_child(parent, pivot, child);

        self.set_child(child, side, pivot);
        self.set_parent(pivot, child);
        trace!("rotated {:?} at {:?}", side, pivot);
    }

    /// Moves the subtree at `new` into the position held by `old`. `new` may be the sentinel,
    /// whose parent is then overwritten for the delete fixup to climb from.
    fn transplant(&mut self, old: Link, new: Link) {
        let parent = self.parent(old);
        self.replace_child(parent, old, new);
        self.set_parent(new, parent);
    }

    pub fn min_from(&self, mut curr: Link) -> Link {
        while let Some(left) = self.child(curr, Side::Left) {
            curr = Some(left);
        }
        curr
    }

    pub fn max_from(&self, mut curr: Link) -> Link {
        while let Some(right) = self.child(curr, Side::Right) {
            curr = Some(right);
        }
        curr
    }

    pub fn find<V>(&self, key: &V) -> Link
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut curr = self.root;
        while let Some(entry) = curr {
            curr = match key.cmp(self.key(entry).borrow()) {
                Ordering::Less => self.child(curr, Side::Left),
                Ordering::Greater => self.child(curr, Side::Right),
                Ordering::Equal => return curr,
            };
        }
        None
    }

    /// Places `key` as a red leaf and rebalances. Equal keys are routed right, so a new key
    /// lands after every key that compares equal to it.
    pub fn insert(&mut self, key: T) -> Result<Entry, TryReserveError>
    where
        T: Ord,
    {
        let mut parent = None;
        let mut side = Side::Left;
        let mut curr = self.root;
        while let Some(entry) = curr {
            parent = curr;
            side = if key < *self.key(entry) {
                Side::Left
            } else {
                Side::Right
            };
            curr = self.child(curr, side);
        }

        let entry = self.arena.allocate(Node::new(key, parent))?;
        if parent.is_none() {
            self.root = Some(entry);
        } else {
            self.set_child(parent, side, Some(entry));
        }
        self.insert_fixup(entry);
        Ok(entry)
    }

    fn insert_fixup(&mut self, entry: Entry) {
        let mut curr = Some(entry);
        while self.color(self.parent(curr)) == Color::Red {
            let parent = self.parent(curr);
            let grandparent = self.parent(parent);
            let side = self.side_of(parent);
            let uncle = self.child(grandparent, side.opposite());

            if self.color(uncle) == Color::Red {
                trace!("insert fixup: red uncle at {:?}", grandparent);
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                curr = grandparent;
                continue;
            }

            if curr == self.child(parent, side.opposite()) {
                trace!("insert fixup: inner child at {:?}", curr);
                curr = parent;
                self.rotate(curr, side);
            }

            trace!("insert fixup: outer child at {:?}", curr);
            let parent = self.parent(curr);
            let grandparent = self.parent(parent);
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            self.rotate(grandparent, side.opposite());
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Unlinks the node at `entry`, rebalances and returns its key. `entry` must be live.
    pub fn erase(&mut self, entry: Entry) -> T {
        let target = Some(entry);
        let mut removed_color = self.color(target);
        let replacement;

        if self.child(target, Side::Left).is_none() {
            replacement = self.child(target, Side::Right);
            self.transplant(target, replacement);
        } else if self.child(target, Side::Right).is_none() {
            replacement = self.child(target, Side::Left);
            self.transplant(target, replacement);
        } else {
            let successor = self.min_from(self.child(target, Side::Right));
            removed_color = self.color(successor);
            replacement = self.child(successor, Side::Right);

            if self.parent(successor) == target {
                self.set_parent(replacement, successor);
            } else {
                self.transplant(successor, replacement);
                let right = self.child(target, Side::Right);
                self.set_child(successor, Side::Right, right);
                self.set_parent(right, successor);
            }

            self.transplant(target, successor);
            let left = self.child(target, Side::Left);
            self.set_child(successor, Side::Left, left);
            self.set_parent(left, successor);
            let color = self.color(target);
            self.set_color(successor, color);
        }

        if removed_color == Color::Black {
            self.erase_fixup(replacement);
        }
        self.nil = Links::sentinel();

        self.arena
            .free(&entry)
            .map(|node| node.key)
            .expect("Expected a live node to erase.")
    }

    /// Repays the missing black on the path through `curr`, which may be the sentinel.
    fn erase_fixup(&mut self, mut curr: Link) {
        while curr != self.root && self.color(curr) == Color::Black {
            let parent = self.parent(curr);
            let side = self.side_of(curr);
            let other = side.opposite();
            let mut sibling = self.child(parent, other);

            if self.color(sibling) == Color::Red {
                trace!("erase fixup: red sibling at {:?}", sibling);
                self.set_color(sibling, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                sibling = self.child(parent, other);
            }

            let near = self.child(sibling, side);
            let far = self.child(sibling, other);
            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                trace!("erase fixup: black nephews at {:?}", sibling);
                self.set_color(sibling, Color::Red);
                curr = parent;
                continue;
            }

            if self.color(far) == Color::Black {
                trace!("erase fixup: red near nephew at {:?}", near);
                self.set_color(near, Color::Black);
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, other);
                sibling = self.child(parent, other);
            }

            trace!("erase fixup: red far nephew under {:?}", sibling);
            let color = self.color(parent);
            self.set_color(sibling, color);
            self.set_color(parent, Color::Black);
            let far = self.child(sibling, other);
            self.set_color(far, Color::Black);
            self.rotate(parent, side);
            curr = self.root;
        }
        self.set_color(curr, Color::Black);
    }

    /// Visits keys in ascending order until `visit` returns `false`.
    pub fn walk_inorder<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&'a T) -> bool,
    {
        let mut stack = Vec::new();
        let mut curr = self.root;
        loop {
            while let Some(entry) = curr {
                stack.push(entry);
                curr = self.child(curr, Side::Left);
            }
            match stack.pop() {
                Some(entry) => {
                    if !visit(self.key(entry)) {
                        return;
                    }
                    curr = self.child(Some(entry), Side::Right);
                },
                None => return,
            }
        }
    }

    /// Releases every node children first and returns how many were released.
    pub fn clear(&mut self) -> usize {
        let mut released = 0;
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push((root, false));
        }
        while let Some((entry, expanded)) = stack.pop() {
            if expanded {
                self.arena.free(&entry);
                released += 1;
                continue;
            }
            stack.push((entry, true));
            let links = self.links(Some(entry));
            if let Some(right) = links.right {
                stack.push((right, false));
            }
            if let Some(left) = links.left {
                stack.push((left, false));
            }
        }
        self.root = None;
        self.nil = Links::sentinel();
        released
    }
}

#[cfg(test)]
impl<T> Tree<T> {
    pub fn links_for_test(&mut self, link: Link) -> &mut Links {
        self.links_mut(link)
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;
    use crate::red_black_tree::node::{Color, Side};

    fn keys(tree: &Tree<u32>) -> Vec<u32> {
        let mut ret = Vec::new();
        tree.walk_inorder(|key| {
            ret.push(*key);
            true
        });
        ret
    }

    #[test]
    fn test_insert_root_is_black() {
        let mut tree = Tree::new(8);
        let entry = tree.insert(1).unwrap();
        assert_eq!(tree.root, Some(entry));
        assert_eq!(tree.color(tree.root), Color::Black);
        assert_eq!(tree.parent(tree.root), None);
    }

    #[test]
    fn test_insert_red_uncle_recolors() {
        let mut tree = Tree::new(8);
        let root = tree.insert(2).unwrap();
        let left = tree.insert(1).unwrap();
        let right = tree.insert(3).unwrap();
        tree.insert(0).unwrap();

        assert_eq!(tree.root, Some(root));
        assert_eq!(tree.color(Some(root)), Color::Black);
        assert_eq!(tree.color(Some(left)), Color::Black);
        assert_eq!(tree.color(Some(right)), Color::Black);
    }

    #[test]
    fn test_insert_outer_child_rotates() {
        let mut tree = Tree::new(8);
        tree.insert(1).unwrap();
        let middle = tree.insert(2).unwrap();
        tree.insert(3).unwrap();

        assert_eq!(tree.root, Some(middle));
        assert_eq!(tree.color(tree.root), Color::Black);
        assert_eq!(tree.color(tree.child(tree.root, Side::Left)), Color::Red);
        assert_eq!(tree.color(tree.child(tree.root, Side::Right)), Color::Red);
        assert_eq!(keys(&tree), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_inner_child_rotates_twice() {
        let mut tree = Tree::new(8);
        tree.insert(3).unwrap();
        tree.insert(1).unwrap();
        let middle = tree.insert(2).unwrap();

        assert_eq!(tree.root, Some(middle));
        assert_eq!(keys(&tree), vec![1, 2, 3]);
    }

    #[test]
    fn test_rotate_both_ways() {
        let mut tree = Tree::new(8);
        let root = tree.insert(2).unwrap();
        let left = tree.insert(1).unwrap();
        let right = tree.insert(3).unwrap();

        tree.rotate(Some(root), Side::Left);
        assert_eq!(tree.root, Some(right));
        assert_eq!(tree.parent(Some(right)), None);
        assert_eq!(tree.child(Some(right), Side::Left), Some(root));
        assert_eq!(tree.parent(Some(root)), Some(right));
        assert_eq!(tree.child(Some(root), Side::Left), Some(left));
        assert_eq!(keys(&tree), vec![1, 2, 3]);

        tree.rotate(Some(right), Side::Right);
        assert_eq!(tree.root, Some(root));
        assert_eq!(tree.child(Some(root), Side::Right), Some(right));
        assert_eq!(tree.parent(Some(right)), Some(root));
        assert_eq!(keys(&tree), vec![1, 2, 3]);
    }

    #[test]
    fn test_rotate_moves_inner_subtree() {
        let mut tree = Tree::new(8);
        for key in &[4, 2, 6, 5, 7] {
            tree.insert(*key).unwrap();
        }
        let root = tree.root;
        let right = tree.child(root, Side::Right);
        let inner = tree.child(right, Side::Left);

        tree.rotate(root, Side::Left);
        assert_eq!(tree.child(root, Side::Right), inner);
        assert_eq!(tree.parent(inner), root);
        assert_eq!(keys(&tree), vec![2, 4, 5, 6, 7]);
    }

    #[test]
    fn test_find() {
        let mut tree = Tree::new(8);
        let entry = tree.insert(5).unwrap();
        tree.insert(3).unwrap();
        assert_eq!(tree.find(&5), Some(entry));
        assert_eq!(tree.find(&4), None);
    }

    #[test]
    fn test_min_max_from_empty() {
        let tree: Tree<u32> = Tree::new(8);
        assert_eq!(tree.min_from(tree.root), None);
        assert_eq!(tree.max_from(tree.root), None);
    }

    #[test]
    fn test_erase_leaf_root() {
        let mut tree = Tree::new(8);
        let entry = tree.insert(1).unwrap();
        assert_eq!(tree.erase(entry), 1);
        assert_eq!(tree.root, None);
        assert_eq!(tree.len(), 0);
        assert_eq!(*tree.sentinel(), crate::red_black_tree::node::Links::sentinel());
    }

    #[test]
    fn test_erase_node_with_two_children() {
        let mut tree = Tree::new(8);
        let mut entries = Vec::new();
        for key in &[5, 3, 8, 1, 4, 7, 9] {
            entries.push(tree.insert(*key).unwrap());
        }
        assert_eq!(tree.erase(entries[0]), 5);
        assert_eq!(keys(&tree), vec![1, 3, 4, 7, 8, 9]);
        assert_eq!(tree.color(tree.root), Color::Black);
        assert_eq!(tree.sentinel().color, Color::Black);
    }

    #[test]
    fn test_erase_black_leaf_runs_fixup() {
        let mut tree = Tree::new(8);
        let mut entries = Vec::new();
        for key in 0..8 {
            entries.push(tree.insert(key).unwrap());
        }
        for entry in entries {
            tree.erase(entry);
            assert_eq!(tree.color(tree.root), Color::Black);
            assert_eq!(tree.parent(tree.root), None);
        }
        assert_eq!(tree.root, None);
    }

    #[test]
    fn test_walk_inorder_stops_early() {
        let mut tree = Tree::new(8);
        for key in &[3, 1, 2] {
            tree.insert(*key).unwrap();
        }
        let mut seen = Vec::new();
        tree.walk_inorder(|key| {
            seen.push(*key);
            seen.len() < 2
        });
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_clear() {
        let mut tree = Tree::new(8);
        let mut entries = Vec::new();
        for key in 0..20 {
            entries.push(tree.insert(key).unwrap());
        }
        assert_eq!(tree.clear(), 20);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.root, None);
        assert!(entries.iter().all(|entry| tree.arena.get(entry).is_none()));
    }
}
