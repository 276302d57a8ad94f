use crate::red_black_tree::node::{Color, Link, Side};
use crate::red_black_tree::tree::Tree;
use std::error;
use std::fmt;

/// A broken red black tree invariant, as reported by `RedBlackSet::validate`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvariantViolation {
    /// The root of a non-empty tree is red.
    RedRoot,
    /// The sentinel is red.
    RedSentinel,
    /// A red node has a red child.
    RedRedEdge,
    /// Two paths from the root to the sentinel cross a different number of black nodes.
    BlackHeightMismatch { expected: usize, found: usize },
    /// An in-order walk produced a key smaller than its predecessor.
    OutOfOrder,
    /// A child does not point back at its parent, or the root has a parent.
    BrokenParentLink,
    /// The number of reachable nodes differs from the number of stored nodes.
    LengthMismatch { reachable: usize, stored: usize },
}

impl error::Error for InvariantViolation {}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::RedRoot => write!(f, "root is red"),
            InvariantViolation::RedSentinel => write!(f, "sentinel is red"),
            InvariantViolation::RedRedEdge => write!(f, "red node has a red child"),
            InvariantViolation::BlackHeightMismatch { expected, found } => write!(
                f,
                "black height mismatch: expected {}, found {}",
                expected, found,
            ),
            InvariantViolation::OutOfOrder => write!(f, "keys are out of order"),
            InvariantViolation::BrokenParentLink => write!(f, "parent link is broken"),
            InvariantViolation::LengthMismatch { reachable, stored } => write!(
                f,
                "{} nodes reachable from the root, {} stored",
                reachable, stored,
            ),
        }
    }
}

/// Checks every structural invariant and returns the black height of the tree.
pub fn validate<T>(tree: &Tree<T>) -> Result<usize, InvariantViolation>
where
    T: Ord,
{
    if tree.sentinel().color != Color::Black {
        return Err(InvariantViolation::RedSentinel);
    }
    if tree.root.is_some() && tree.color(tree.root) != Color::Black {
        return Err(InvariantViolation::RedRoot);
    }
    if tree.parent(tree.root).is_some() {
        return Err(InvariantViolation::BrokenParentLink);
    }

    let black_height = check_structure(tree)?;
    check_order(tree)?;
    Ok(black_height)
}

// Depth-first walk carrying the number of black nodes above each link.
fn check_structure<T>(tree: &Tree<T>) -> Result<usize, InvariantViolation> {
    let mut expected = None;
    let mut reachable = 0;
    let mut stack: Vec<(Link, usize)> = vec![(tree.root, 0)];

    while let Some((link, blacks)) = stack.pop() {
        if link.is_none() {
            match expected {
                None => expected = Some(blacks),
                Some(expected) if expected != blacks => {
                    return Err(InvariantViolation::BlackHeightMismatch {
                        expected,
                        found: blacks,
                    });
                },
                Some(_) => {},
            }
            continue;
        }

        reachable += 1;
        let color = tree.color(link);
        let blacks = if color == Color::Black {
            blacks + 1
        } else {
            blacks
        };
        for side in &[Side::Left, Side::Right] {
            let child = tree.child(link, *side);
            if child.is_some() {
                if tree.parent(child) != link {
                    return Err(InvariantViolation::BrokenParentLink);
                }
                if color == Color::Red && tree.color(child) == Color::Red {
                    return Err(InvariantViolation::RedRedEdge);
                }
            }
            stack.push((child, blacks));
        }
    }

    if reachable != tree.len() {
        return Err(InvariantViolation::LengthMismatch {
            reachable,
            stored: tree.len(),
        });
    }
    Ok(expected.unwrap_or(0))
}

fn check_order<T>(tree: &Tree<T>) -> Result<(), InvariantViolation>
where
    T: Ord,
{
    let mut prev: Option<&T> = None;
    let mut sorted = true;
    tree.walk_inorder(|key| {
        if let Some(prev) = prev {
            if key < prev {
                sorted = false;
                return false;
            }
        }
        prev = Some(key);
        true
    });
    if sorted {
        Ok(())
    } else {
        Err(InvariantViolation::OutOfOrder)
    }
}
