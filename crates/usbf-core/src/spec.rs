//! Spec — named dimensions of nested argument data
//!
//! A [`Spec`] mirrors the shape of a [`Tree`] of arguments and names the
//! leading axes of each leaf. Two arguments that share a dimension name share
//! that logical axis and must agree on its size. A spec leaf may cover a whole
//! data sub-tree: `receiver: ["receivers"]` gives every field of the receiver
//! (position, angles, ...) a leading `receivers` axis. Axes beyond the named ones
//! are intrinsic to the value (the `xyz` axis of a position, or the `time` axis
//! of a signal that is never vectorized over).
//!
//! ## Example
//!
//! ```rust
//! use usbf_core::spec::Spec;
//!
//! let spec = Spec::tree()
//!     .with("point", Spec::dims(["points"]))
//!     .with("signal", Spec::dims(["transmits", "receivers"]));
//! assert!(spec.has_dimension("receivers"));
//! let inner = spec.remove_dimension("points").unwrap();
//! assert!(!inner.has_dimension("points"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::tensor::Tensor;
use crate::tree::Tree;

/// Errors raised when a spec does not describe the data (or the step) it is used with
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecError {
    #[error("Spec does not have dimension {0}")]
    MissingDimension(String),

    #[error("dimension \"{dimension}\" appears more than once in {dims:?}")]
    DuplicateDimension { dimension: String, dims: Vec<String> },

    #[error("dimension \"{dimension}\" has size {expected} in one field but {actual} at `{path}`")]
    InconsistentSize {
        dimension: String,
        expected: usize,
        actual: usize,
        path: String,
    },

    #[error("data at `{path}` has {ndim} axes, fewer than the {required} named by the spec")]
    TooFewAxes { path: String, ndim: usize, required: usize },

    #[error("spec and data do not have the same structure at `{0}`")]
    StructureMismatch(String),

    #[error("no field in the data has dimension \"{0}\"")]
    UnknownSize(String),

    #[error("{0} must be built with an input spec before it is called")]
    NotBuilt(String),

    #[error("`{field}` still has dimensions {dims:?} where a single value is expected")]
    UnexpectedDimensions { field: String, dims: Vec<String> },
}

/// Dimension names per leaf of an argument tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec(Tree<Vec<String>>);

impl Spec {
    /// A leaf spec with the given dimensions.
    pub fn dims<I, S>(dims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Spec(Tree::Leaf(dims.into_iter().map(Into::into).collect()))
    }

    /// A dimensionless leaf (a scalar or an un-vectorized value).
    pub fn scalar() -> Self {
        Spec(Tree::Leaf(Vec::new()))
    }

    /// An empty node; add fields with [`Spec::with`].
    pub fn tree() -> Self {
        Spec(Tree::node())
    }

    pub fn with(mut self, key: impl Into<String>, spec: Spec) -> Self {
        self.0.insert(key, spec.0);
        self
    }

    pub fn from_tree(tree: Tree<Vec<String>>) -> Self {
        Spec(tree)
    }

    pub fn as_tree(&self) -> &Tree<Vec<String>> {
        &self.0
    }

    pub fn is_leaf(&self) -> bool {
        self.0.is_leaf()
    }

    /// The dimensions of a leaf spec.
    pub fn leaf_dims(&self) -> Option<&[String]> {
        self.0.as_leaf().map(Vec::as_slice)
    }

    pub fn field(&self, key: &str) -> Option<Spec> {
        self.0.get(key).cloned().map(Spec)
    }

    pub fn has_dimension(&self, dim: &str) -> bool {
        self.0.leaves().iter().any(|(_, dims)| dims.iter().any(|d| d == dim))
    }

    /// Every distinct dimension, in first-seen order.
    pub fn dimensions(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for (_, dims) in self.0.leaves() {
            for d in dims {
                if !out.contains(d) {
                    out.push(d.clone());
                }
            }
        }
        out
    }

    /// Axis position of `dim` in a leaf spec. `None` for node specs and for
    /// absent dimensions.
    pub fn index_for(&self, dim: &str) -> Option<usize> {
        self.leaf_dims().and_then(|dims| dims.iter().position(|d| d == dim))
    }

    /// Remove `dim` from every leaf. Fails when no leaf has it.
    pub fn remove_dimension(&self, dim: &str) -> Result<Spec, SpecError> {
        if !self.has_dimension(dim) {
            return Err(SpecError::MissingDimension(dim.to_string()));
        }
        Ok(self.update_leaves(|dims| dims.iter().filter(|d| *d != dim).cloned().collect()))
    }

    /// Prepend `dim` to every leaf.
    pub fn add_dimension(&self, dim: &str) -> Spec {
        self.update_leaves(|dims| {
            let mut out = Vec::with_capacity(dims.len() + 1);
            out.push(dim.to_string());
            out.extend(dims.iter().filter(|d| *d != dim).cloned());
            out
        })
    }

    pub fn update_leaves(&self, f: impl Fn(&[String]) -> Vec<String>) -> Spec {
        Spec(self.0.map(&|dims: &Vec<String>| f(dims)))
    }

    /// For every data leaf, the axis that `dim` occupies (if any).
    ///
    /// Data fields that the spec does not mention are treated as not having
    /// any named dimension.
    pub fn axes_for(&self, dim: &str, data: &Tree<Tensor>) -> Result<Tree<Option<usize>>, SpecError> {
        fn walk(
            spec: &Tree<Vec<String>>,
            data: &Tree<Tensor>,
            dim: &str,
            path: &mut Vec<String>,
        ) -> Result<Tree<Option<usize>>, SpecError> {
            match (spec, data) {
                (Tree::Leaf(dims), _) => {
                    let axis = dims.iter().position(|d| d == dim);
                    Ok(data.map(&|_| axis))
                }
                (Tree::Node(sc), Tree::Node(dc)) => {
                    let mut out = BTreeMap::new();
                    for (k, child) in dc {
                        path.push(k.clone());
                        let axes = match sc.get(k) {
                            Some(s) => walk(s, child, dim, path)?,
                            None => child.map(&|_| None),
                        };
                        path.pop();
                        out.insert(k.clone(), axes);
                    }
                    Ok(Tree::Node(out))
                }
                (Tree::Node(_), Tree::Leaf(_)) => Err(SpecError::StructureMismatch(path.join("."))),
            }
        }
        walk(&self.0, data, dim, &mut Vec::new())
    }

    /// The size of `dim` as found in the data. Every field that has the
    /// dimension must agree.
    pub fn size_of(&self, dim: &str, data: &Tree<Tensor>) -> Result<usize, SpecError> {
        let axes = self.axes_for(dim, data)?;
        let mut size: Option<usize> = None;
        let axes_leaves = axes.leaves();
        for ((path, tensor), (_, axis)) in data.leaves().into_iter().zip(axes_leaves) {
            let Some(axis) = *axis else { continue };
            let actual = *tensor.shape().get(axis).ok_or_else(|| SpecError::TooFewAxes {
                path: path.join("."),
                ndim: tensor.ndim(),
                required: axis + 1,
            })?;
            match size {
                None => size = Some(actual),
                Some(expected) if expected != actual => {
                    return Err(SpecError::InconsistentSize {
                        dimension: dim.to_string(),
                        expected,
                        actual,
                        path: path.join("."),
                    })
                }
                _ => {}
            }
        }
        size.ok_or_else(|| SpecError::UnknownSize(dim.to_string()))
    }

    /// Check that the spec describes `data`: matching structure, unique names
    /// per leaf, enough axes for the named dimensions, and consistent sizes.
    pub fn validate(&self, data: &Tree<Tensor>) -> Result<(), SpecError> {
        for (_, dims) in self.0.leaves() {
            for (i, d) in dims.iter().enumerate() {
                if dims[i + 1..].contains(d) {
                    return Err(SpecError::DuplicateDimension {
                        dimension: d.clone(),
                        dims: dims.clone(),
                    });
                }
            }
        }
        let rank = self.rank_tree(data)?;
        for ((path, tensor), (_, required)) in data.leaves().into_iter().zip(rank.leaves()) {
            if tensor.ndim() < *required {
                return Err(SpecError::TooFewAxes {
                    path: path.join("."),
                    ndim: tensor.ndim(),
                    required: *required,
                });
            }
        }
        for dim in self.dimensions() {
            self.size_of(&dim, data)?;
        }
        Ok(())
    }

    fn rank_tree(&self, data: &Tree<Tensor>) -> Result<Tree<usize>, SpecError> {
        fn walk(spec: &Tree<Vec<String>>, data: &Tree<Tensor>, path: &mut Vec<String>) -> Result<Tree<usize>, SpecError> {
            match (spec, data) {
                (Tree::Leaf(dims), _) => Ok(data.map(&|_| dims.len())),
                (Tree::Node(sc), Tree::Node(dc)) => {
                    let mut out = BTreeMap::new();
                    for (k, child) in dc {
                        path.push(k.clone());
                        let r = match sc.get(k) {
                            Some(s) => walk(s, child, path)?,
                            None => child.map(&|_| 0),
                        };
                        path.pop();
                        out.insert(k.clone(), r);
                    }
                    Ok(Tree::Node(out))
                }
                (Tree::Node(_), Tree::Leaf(_)) => Err(SpecError::StructureMismatch(path.join("."))),
            }
        }
        walk(&self.0, data, &mut Vec::new())
    }
}

impl From<Vec<&str>> for Spec {
    fn from(dims: Vec<&str>) -> Self {
        Spec::dims(dims)
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_tree(t: &Tree<Vec<String>>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match t {
                Tree::Leaf(dims) => write!(f, "{:?}", dims),
                Tree::Node(c) => {
                    write!(f, "{{")?;
                    for (i, (k, v)) in c.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: ", k)?;
                        write_tree(v, f)?;
                    }
                    write!(f, "}}")
                }
            }
        }
        write!(f, "Spec(")?;
        write_tree(&self.0, f)?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel_spec() -> Spec {
        Spec::tree()
            .with("point", Spec::dims(["points"]))
            .with("receiver", Spec::dims(["receivers"]))
            .with("signal", Spec::dims(["transmits", "receivers"]))
    }

    fn kernel_data() -> Tree<Tensor> {
        Tree::node()
            .with("point", Tensor::zeros(&[5, 3]))
            .with(
                "receiver",
                Tree::node()
                    .with("position", Tensor::zeros(&[4, 3]))
                    .with("theta", Tensor::zeros(&[4])),
            )
            .with("signal", Tensor::zeros(&[2, 4, 100]))
    }

    #[test]
    fn test_add_and_remove() {
        let spec = Spec::dims(["a", "b"]);
        assert_eq!(spec.remove_dimension("b").unwrap(), Spec::dims(["a"]));
        assert_eq!(spec.add_dimension("c"), Spec::dims(["c", "a", "b"]));
        assert_eq!(
            spec.remove_dimension("x"),
            Err(SpecError::MissingDimension("x".to_string()))
        );
    }

    #[test]
    fn test_index_for() {
        let spec = Spec::dims(["a", "b"]);
        assert_eq!(spec.index_for("b"), Some(1));
        assert_eq!(spec.index_for("z"), None);
        assert_eq!(kernel_spec().index_for("points"), None);
    }

    #[test]
    fn test_axes_for_covers_subtrees() {
        let axes = kernel_spec().axes_for("receivers", &kernel_data()).unwrap();
        assert_eq!(axes.get_path(&["receiver", "theta"]), Some(&Tree::Leaf(Some(0))));
        assert_eq!(axes.get("signal"), Some(&Tree::Leaf(Some(1))));
        assert_eq!(axes.get("point"), Some(&Tree::Leaf(None)));
    }

    #[test]
    fn test_size_of() {
        let spec = kernel_spec();
        let data = kernel_data();
        assert_eq!(spec.size_of("receivers", &data).unwrap(), 4);
        assert_eq!(spec.size_of("points", &data).unwrap(), 5);
        assert!(spec.validate(&data).is_ok());
    }

    #[test]
    fn test_inconsistent_sizes_are_rejected() {
        let data = kernel_data().with("signal", Tensor::zeros(&[2, 3, 100]));
        let err = kernel_spec().validate(&data).unwrap_err();
        assert!(matches!(err, SpecError::InconsistentSize { ref dimension, .. } if dimension == "receivers"));
    }

    #[test]
    fn test_duplicate_and_rank_checks() {
        let data = Tree::leaf(Tensor::zeros(&[2, 2]));
        assert!(matches!(
            Spec::dims(["a", "a"]).validate(&data),
            Err(SpecError::DuplicateDimension { .. })
        ));
        assert!(matches!(
            Spec::dims(["a", "b", "c"]).validate(&data),
            Err(SpecError::TooFewAxes { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Spec::dims(["c", "a"]).to_string(), r#"Spec(["c", "a"])"#);
    }
}
