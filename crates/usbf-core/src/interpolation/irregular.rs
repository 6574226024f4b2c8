use super::{centered_offsets, Coordinates, IndicesInfo};

/// Samples at arbitrary, ascending positions.
#[derive(Debug, Clone, PartialEq)]
pub struct IrregularSampledCoordinates {
    pub x_data: Vec<f64>,
}

impl IrregularSampledCoordinates {
    pub fn new(x_data: Vec<f64>) -> Self {
        Self { x_data }
    }

    fn nearest(&self, x: f64) -> usize {
        self.x_data
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |(best, best_d), (i, v)| {
                let d = (v - x).abs();
                if d < best_d {
                    (i, d)
                } else {
                    (best, best_d)
                }
            })
            .0
    }
}

impl Coordinates for IrregularSampledCoordinates {
    fn start(&self) -> f64 {
        self.x_data.first().copied().unwrap_or(f64::NAN)
    }

    fn stop(&self) -> f64 {
        self.x_data.last().copied().unwrap_or(f64::NAN)
    }

    /// For an even count the window is centered between the two samples that
    /// bracket `x`: the nearest sample moves one step up unless it already lies
    /// above `x`. A position exactly on a sample brackets it with the next one.
    ///
    /// Indices past either end are clipped; their positions are those of the
    /// clipped sample plus one, so that a clipped pair never sits at zero
    /// distance from `x` on both sides.
    fn get_nearest_indices(&self, x: f64, n_samples: usize) -> IndicesInfo {
        let last = self.x_data.len().saturating_sub(1) as i64;
        let mut nearest = self.nearest(x) as i64;
        if n_samples % 2 == 0 && !self.x_data.is_empty() && self.x_data[nearest as usize] - x <= 0.0 {
            nearest += 1;
        }
        let (indices, positions): (Vec<usize>, Vec<f64>) = centered_offsets(n_samples)
            .map(|offset| {
                let unclipped = nearest + offset;
                let i = unclipped.clamp(0, last) as usize;
                let position = self.x_data.get(i).copied().unwrap_or(f64::NAN);
                if i as i64 == unclipped {
                    (i, position)
                } else {
                    (i, position + 1.0)
                }
            })
            .unzip();
        IndicesInfo { x, indices, positions, within_bounds: self.is_within_bounds(x) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> IrregularSampledCoordinates {
        IrregularSampledCoordinates::new(vec![0.0, 1.0, 3.0, 7.0])
    }

    #[test]
    fn test_even_samples_bracket_x_from_either_side() {
        // Nearest sample above x
        assert_eq!(coords().get_nearest_indices(2.5, 2).indices, vec![1, 2]);
        // Nearest sample below x
        assert_eq!(coords().get_nearest_indices(1.4, 2).indices, vec![1, 2]);
        assert_eq!(coords().get_nearest_indices(4.0, 2).indices, vec![2, 3]);
    }

    #[test]
    fn test_even_samples_on_grid_points() {
        let info = coords().get_nearest_indices(3.0, 2);
        assert_eq!(info.indices, vec![2, 3]);
        assert_eq!(info.offset_distances(), vec![0.0, 4.0]);

        let info = coords().get_nearest_indices(0.0, 2);
        assert_eq!(info.indices, vec![0, 1]);

        // The last sample pairs with itself after clipping, one unit further out.
        let info = coords().get_nearest_indices(7.0, 2);
        assert_eq!(info.indices, vec![3, 3]);
        assert_eq!(info.positions, vec![7.0, 8.0]);
        assert_eq!(info.offset_distances(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_clipped_positions_below_start() {
        let info = coords().get_nearest_indices(-0.2, 4);
        assert_eq!(info.indices, vec![0, 0, 0, 1]);
        assert_eq!(info.positions, vec![1.0, 1.0, 0.0, 1.0]);
        assert!(!info.within_bounds);
    }

    #[test]
    fn test_odd_samples_and_bounds() {
        let info = coords().get_nearest_indices(2.9, 3);
        assert_eq!(info.indices, vec![1, 2, 3]);
        assert!(info.within_bounds);

        let info = coords().get_nearest_indices(-1.0, 1);
        assert_eq!(info.indices, vec![0]);
        assert!(!info.within_bounds);
        assert!(!coords().is_within_bounds(7.0));
    }
}
