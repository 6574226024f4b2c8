//! Traceable — typed values as trees of plain arrays
//!
//! Transformations such as [`ForAll`](crate::transform::ForAll) only know how to
//! slice and stack tensors. Composite kernel arguments (element geometry, wave
//! data) implement [`Traceable`] so they can be flattened into a
//! [`Tree<Tensor>`] before a pipeline runs and rebuilt from a slice inside the
//! kernel.
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::traceable::Traceable;
//! use usbf_core::types::Vec3;
//!
//! let p = Vec3::new(0.0, 0.0, 0.03);
//! let tree = p.decompose();
//! assert_eq!(Vec3::reconstruct(&tree).unwrap(), p);
//! ```

use crate::tensor::Tensor;
use crate::tree::Tree;
use crate::types::{BeamResult, PreconditionError, Vec3};

/// Decompose into primitive arrays and reconstruct from them.
pub trait Traceable: Sized {
    fn decompose(&self) -> Tree<Tensor>;

    fn reconstruct(tree: &Tree<Tensor>) -> BeamResult<Self>;
}

impl Traceable for Vec3 {
    fn decompose(&self) -> Tree<Tensor> {
        Tree::leaf(Tensor::from_vec3(*self))
    }

    fn reconstruct(tree: &Tree<Tensor>) -> BeamResult<Self> {
        Ok(leaf(tree, "position")?.to_vec3()?)
    }
}

impl Traceable for f64 {
    fn decompose(&self) -> Tree<Tensor> {
        Tree::leaf(Tensor::scalar(*self))
    }

    fn reconstruct(tree: &Tree<Tensor>) -> BeamResult<Self> {
        Ok(leaf(tree, "value")?.to_scalar()?)
    }
}

/// The tensor at a leaf, or `MissingField(name)` when the tree is a node.
pub(crate) fn leaf<'a>(tree: &'a Tree<Tensor>, name: &'static str) -> BeamResult<&'a Tensor> {
    tree.as_leaf().ok_or_else(|| PreconditionError::MissingField(name).into())
}

/// A required child of a node.
pub(crate) fn field<'a>(tree: &'a Tree<Tensor>, name: &'static str) -> BeamResult<&'a Tree<Tensor>> {
    tree.get(name).ok_or_else(|| PreconditionError::MissingField(name).into())
}

/// A required scalar child of a node.
pub(crate) fn scalar_field(tree: &Tree<Tensor>, name: &'static str) -> BeamResult<f64> {
    Ok(leaf(field(tree, name)?, name)?.to_scalar()?)
}

/// An optional scalar child of a node.
pub(crate) fn optional_scalar(tree: &Tree<Tensor>, name: &'static str) -> BeamResult<Option<f64>> {
    match tree.get(name) {
        Some(t) => Ok(Some(leaf(t, name)?.to_scalar()?)),
        None => Ok(None),
    }
}

/// An optional point child of a node.
pub(crate) fn optional_point(tree: &Tree<Tensor>, name: &'static str) -> BeamResult<Option<Vec3>> {
    match tree.get(name) {
        Some(t) => Ok(Some(leaf(t, name)?.to_vec3()?)),
        None => Ok(None),
    }
}

/// Number of items along the leading axis of a batched tree.
pub(crate) fn batch_size(tree: &Tree<Tensor>) -> usize {
    tree.leaves()
        .first()
        .and_then(|(_, t)| t.shape().first().copied())
        .unwrap_or(0)
}

/// Rebuild every item of a tree batched along axis 0.
pub fn reconstruct_batch<T: Traceable>(tree: &Tree<Tensor>) -> BeamResult<Vec<T>> {
    let axes: Tree<Option<usize>> = Tree::leaf(Some(0));
    (0..batch_size(tree))
        .map(|i| T::reconstruct(&tree.slice_along(&axes, i)?))
        .collect()
}

/// Decompose every item and stack the trees along a new axis 0. Items must
/// decompose to trees of the same shape.
pub fn decompose_batch<T: Traceable>(items: &[T]) -> BeamResult<Tree<Tensor>> {
    let trees: Vec<Tree<Tensor>> = items.iter().map(Traceable::decompose).collect();
    Ok(Tree::stack(&trees, 0)?)
}
