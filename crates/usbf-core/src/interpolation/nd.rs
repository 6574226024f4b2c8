use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Coordinates, EdgeHandling, IndicesInfo};
use crate::spec::SpecError;
use crate::tensor::Tensor;
use crate::types::BeamResult;

/// Data with a named axis per dimension and a coordinate description for the
/// axes that can be interpolated.
#[derive(Debug, Clone)]
pub struct NamedData {
    pub data: Tensor,
    pub dims: Vec<String>,
    pub coordinates: BTreeMap<String, Arc<dyn Coordinates>>,
}

impl NamedData {
    pub fn new(data: Tensor, dims: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { data, dims: dims.into_iter().map(Into::into).collect(), coordinates: BTreeMap::new() }
    }

    pub fn with_coordinates(mut self, dim: impl Into<String>, coordinates: impl Coordinates + 'static) -> Self {
        self.coordinates.insert(dim.into(), Arc::new(coordinates));
        self
    }

    fn lookup(&self, dims: &[String], dim: &str) -> BeamResult<(usize, &Arc<dyn Coordinates>)> {
        let missing = || SpecError::MissingDimension(dim.to_string());
        let axis = dims.iter().position(|d| d == dim).ok_or_else(missing)?;
        let coordinates = self.coordinates.get(dim).ok_or_else(missing)?;
        Ok((axis, coordinates))
    }
}

fn apply_edge(edge: &EdgeHandling, within_bounds: bool, values: Tensor) -> BeamResult<Tensor> {
    match edge {
        EdgeHandling::Value { left, .. } if !within_bounds => Ok(EdgeHandling::fill(left, &values)?),
        _ => Ok(values),
    }
}

/// Multilinear interpolation over any subset of the named dimensions.
///
/// With [`EdgeHandling::Nearest`] out-of-range positions read the edge sample;
/// with [`EdgeHandling::Value`] the `left` value is returned whenever any
/// position is outside its axis.
#[derive(Debug, Clone)]
pub struct LinearNDInterpolator {
    pub source: NamedData,
    pub edge: EdgeHandling,
}

impl LinearNDInterpolator {
    pub fn new(source: NamedData, edge: EdgeHandling) -> Self {
        Self { source, edge }
    }

    fn weights(info: &IndicesInfo) -> [f64; 2] {
        let d = info.offset_distances();
        let total = d[0] + d[1];
        if total == 0.0 {
            [0.5, 0.5]
        } else {
            [1.0 - d[0] / total, 1.0 - d[1] / total]
        }
    }

    /// Interpolate at the given positions. The interpolated axes are removed
    /// from the result; the others are kept in order.
    pub fn interpolate(&self, xi: &[(&str, f64)]) -> BeamResult<Tensor> {
        let mut values = self.source.data.clone();
        let mut dims = self.source.dims.clone();
        let mut within_bounds = true;
        for &(dim, x) in xi {
            let (axis, coordinates) = self.source.lookup(&dims, dim)?;
            let info = coordinates.get_nearest_indices(x, 2);
            within_bounds &= info.within_bounds;
            let [w0, w1] = Self::weights(&info);
            let a = values.index_axis(axis, info.indices[0])?.mul(&Tensor::scalar(w0))?;
            let b = values.index_axis(axis, info.indices[1])?.mul(&Tensor::scalar(w1))?;
            values = a.add(&b)?;
            dims.remove(axis);
        }
        apply_edge(&self.edge, within_bounds, values)
    }
}

/// Nearest-sample lookup over any subset of the named dimensions.
#[derive(Debug, Clone)]
pub struct NearestNDInterpolator {
    pub source: NamedData,
    pub edge: EdgeHandling,
}

impl NearestNDInterpolator {
    pub fn new(source: NamedData, edge: EdgeHandling) -> Self {
        Self { source, edge }
    }

    pub fn interpolate(&self, xi: &[(&str, f64)]) -> BeamResult<Tensor> {
        let mut values = self.source.data.clone();
        let mut dims = self.source.dims.clone();
        let mut within_bounds = true;
        for &(dim, x) in xi {
            let (axis, coordinates) = self.source.lookup(&dims, dim)?;
            let info = coordinates.get_nearest_indices(x, 1);
            within_bounds &= info.within_bounds;
            values = values.index_axis(axis, info.indices[0])?;
            dims.remove(axis);
        }
        apply_edge(&self.edge, within_bounds, values)
    }
}
