//! Tree — nested named argument structures
//!
//! Beamforming kernels take many named arguments, some of which are composite
//! (an element has a position and orientation angles, a wave has a source and
//! steering angles). A [`Tree`] is either a leaf value or a node of named
//! children. Argument data is a `Tree<Tensor>`; a [`Spec`](crate::spec::Spec)
//! is a tree of dimension-name lists with the same shape.
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::tree::Tree;
//!
//! let t: Tree<i32> = Tree::node()
//!     .with("a", 1)
//!     .with("b", Tree::node().with("c", 2));
//! assert_eq!(t.leaves().len(), 2);
//! assert_eq!(t.get_path(&["b", "c"]).and_then(Tree::as_leaf), Some(&2));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::tensor::{Tensor, TensorError};

/// A leaf value or a node of named sub-trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree<L> {
    Leaf(L),
    Node(BTreeMap<String, Tree<L>>),
}

impl<L> Tree<L> {
    pub fn leaf(value: L) -> Self {
        Tree::Leaf(value)
    }

    /// An empty node.
    pub fn node() -> Self {
        Tree::Node(BTreeMap::new())
    }

    /// Builder-style insert. Turns a leaf into a node.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Tree<L>>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a child, replacing the tree with a node if it was a leaf.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Tree<L>>) {
        if let Tree::Leaf(_) = self {
            *self = Tree::node();
        }
        if let Tree::Node(children) = self {
            children.insert(key.into(), value.into());
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Tree::Leaf(l) => Some(l),
            Tree::Node(_) => None,
        }
    }

    pub fn into_leaf(self) -> Option<L> {
        match self {
            Tree::Leaf(l) => Some(l),
            Tree::Node(_) => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, Tree<L>>> {
        match self {
            Tree::Leaf(_) => None,
            Tree::Node(c) => Some(c),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Tree<L>> {
        self.children().and_then(|c| c.get(key))
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Tree<L>> {
        path.iter().try_fold(self, |t, key| t.get(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<Tree<L>> {
        match self {
            Tree::Leaf(_) => None,
            Tree::Node(c) => c.remove(key),
        }
    }

    /// All leaves with their paths, in key order.
    pub fn leaves(&self) -> Vec<(Vec<String>, &L)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a L)>) {
        match self {
            Tree::Leaf(l) => out.push((path.clone(), l)),
            Tree::Node(children) => {
                for (k, child) in children {
                    path.push(k.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }

    pub fn map<M>(&self, f: &impl Fn(&L) -> M) -> Tree<M> {
        match self {
            Tree::Leaf(l) => Tree::Leaf(f(l)),
            Tree::Node(c) => Tree::Node(c.iter().map(|(k, v)| (k.clone(), v.map(f))).collect()),
        }
    }

    pub fn try_map<M, E>(&self, f: &impl Fn(&L) -> Result<M, E>) -> Result<Tree<M>, E> {
        Ok(match self {
            Tree::Leaf(l) => Tree::Leaf(f(l)?),
            Tree::Node(c) => Tree::Node(
                c.iter()
                    .map(|(k, v)| Ok((k.clone(), v.try_map(f)?)))
                    .collect::<Result<_, E>>()?,
            ),
        })
    }

    /// Combine two trees leaf by leaf. A leaf on one side is paired with every
    /// leaf of the sub-tree on the other side; nodes must have the same keys.
    pub fn zip_with<R, M, E>(
        &self,
        other: &Tree<R>,
        f: &impl Fn(&L, &R) -> Result<M, E>,
        mismatch: &impl Fn(&str) -> E,
    ) -> Result<Tree<M>, E> {
        match (self, other) {
            (Tree::Leaf(a), Tree::Leaf(b)) => Ok(Tree::Leaf(f(a, b)?)),
            (Tree::Leaf(a), Tree::Node(_)) => other.try_map(&|b| f(a, b)),
            (Tree::Node(_), Tree::Leaf(b)) => self.try_map(&|a| f(a, b)),
            (Tree::Node(ca), Tree::Node(cb)) => {
                let mut out = BTreeMap::new();
                for (k, va) in ca {
                    let vb = cb.get(k).ok_or_else(|| mismatch(k))?;
                    out.insert(k.clone(), va.zip_with(vb, f, mismatch)?);
                }
                if let Some(k) = cb.keys().find(|k| !ca.contains_key(*k)) {
                    return Err(mismatch(k));
                }
                Ok(Tree::Node(out))
            }
        }
    }
}

impl<L: Clone> Tree<L> {
    /// Union of two nodes; on key collisions `other` wins (recursively for nodes).
    pub fn merge(&self, other: &Tree<L>) -> Tree<L> {
        match (self, other) {
            (Tree::Node(a), Tree::Node(b)) => {
                let mut out = a.clone();
                for (k, vb) in b {
                    let merged = match a.get(k) {
                        Some(va) => va.merge(vb),
                        None => vb.clone(),
                    };
                    out.insert(k.clone(), merged);
                }
                Tree::Node(out)
            }
            (_, other) => other.clone(),
        }
    }
}

impl<L> From<L> for Tree<L> {
    fn from(value: L) -> Self {
        Tree::Leaf(value)
    }
}

impl<L: fmt::Display> fmt::Display for Tree<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Leaf(l) => write!(f, "{}", l),
            Tree::Node(c) => {
                write!(f, "{{")?;
                for (i, (k, v)) in c.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Argument data flowing through a transformed function.
pub type Args = Tree<Tensor>;

impl Tree<Tensor> {
    /// Take index `i` of every leaf whose axis is given in `axes`; leaves with
    /// no axis are passed through untouched.
    pub fn slice_along(&self, axes: &Tree<Option<usize>>, i: usize) -> Result<Args, TensorError> {
        self.map_along(axes, &|t, axis| t.index_axis(axis, i))
    }

    /// What [`slice_along`](Self::slice_along) would return if the sliced axes
    /// were not empty: zeros in place of every sliced leaf, with that axis removed.
    pub fn placeholder_along(&self, axes: &Tree<Option<usize>>) -> Result<Args, TensorError> {
        self.map_along(axes, &|t, axis| t.zeros_without_axis(axis))
    }

    fn map_along(
        &self,
        axes: &Tree<Option<usize>>,
        f: &impl Fn(&Tensor, usize) -> Result<Tensor, TensorError>,
    ) -> Result<Args, TensorError> {
        match (self, axes) {
            (Tree::Leaf(t), Tree::Leaf(Some(axis))) => Ok(Tree::Leaf(f(t, *axis)?)),
            (Tree::Leaf(t), _) => Ok(Tree::Leaf(t.clone())),
            (Tree::Node(c), Tree::Node(ac)) => Ok(Tree::Node(
                c.iter()
                    .map(|(k, v)| {
                        let mapped = match ac.get(k) {
                            Some(a) => v.map_along(a, f)?,
                            None => v.clone(),
                        };
                        Ok((k.clone(), mapped))
                    })
                    .collect::<Result<_, TensorError>>()?,
            )),
            (Tree::Node(_), Tree::Leaf(None)) => Ok(self.clone()),
            (Tree::Node(_), Tree::Leaf(Some(axis))) => {
                let axis = *axis;
                self.try_map(&|t: &Tensor| f(t, axis))
            }
        }
    }

    /// Stack a list of equally-shaped trees leaf by leaf along a new `axis`.
    pub fn stack(trees: &[Args], axis: usize) -> Result<Args, TensorError> {
        let first = trees.first().ok_or(TensorError::EmptyStack)?;
        match first {
            Tree::Leaf(_) => {
                let leaves: Vec<Tensor> = trees
                    .iter()
                    .map(|t| t.as_leaf().cloned().ok_or(TensorError::EmptyStack))
                    .collect::<Result<_, _>>()?;
                Ok(Tree::Leaf(Tensor::stack(axis, &leaves)?))
            }
            Tree::Node(keys) => {
                let mut out = BTreeMap::new();
                for k in keys.keys() {
                    let children: Vec<Args> = trees
                        .iter()
                        .map(|t| t.get(k).cloned().ok_or(TensorError::EmptyStack))
                        .collect::<Result<_, _>>()?;
                    out.insert(k.clone(), Tree::stack(&children, axis)?);
                }
                Ok(Tree::Node(out))
            }
        }
    }

    /// Shape description, e.g. `{point: [3], signal: [128]}`.
    pub fn shapes(&self) -> Tree<Vec<usize>> {
        self.map(&|t: &Tensor| t.shape().to_vec())
    }
}
