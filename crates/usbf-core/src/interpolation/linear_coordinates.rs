use super::{centered_offsets, Coordinates, IndicesInfo};

/// `size` evenly spaced samples from `start` to `stop`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCoordinates {
    pub start: f64,
    pub stop: f64,
    pub size: usize,
}

impl LinearCoordinates {
    pub const fn new(start: f64, stop: f64, size: usize) -> Self {
        Self { start, stop, size }
    }

    pub fn spacing(&self) -> f64 {
        if self.size <= 1 {
            0.0
        } else {
            (self.stop - self.start) / (self.size - 1) as f64
        }
    }
}

impl Coordinates for LinearCoordinates {
    fn start(&self) -> f64 {
        self.start
    }

    fn stop(&self) -> f64 {
        self.stop
    }

    /// Positions are reported for the unclipped indices, so a position past
    /// either end lies on the extension of the grid.
    fn get_nearest_indices(&self, x: f64, n_samples: usize) -> IndicesInfo {
        let last = self.size.saturating_sub(1) as i64;
        let spacing = self.spacing();
        let mut fractional = if spacing == 0.0 { 0.0 } else { (x - self.start) / spacing };
        if n_samples % 2 == 0 {
            fractional += 0.5;
        }
        let nearest = fractional.round() as i64;
        let (indices, positions) = centered_offsets(n_samples)
            .map(|offset| {
                let i = nearest + offset;
                (i.clamp(0, last) as usize, self.start + i as f64 * spacing)
            })
            .unzip();
        IndicesInfo { x, indices, positions, within_bounds: self.is_within_bounds(x) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> LinearCoordinates {
        LinearCoordinates::new(0.0, 4.0, 5)
    }

    #[test]
    fn test_two_samples_bracket_x() {
        let info = coords().get_nearest_indices(2.3, 2);
        assert_eq!(info.indices, vec![2, 3]);
        assert_eq!(info.positions, vec![2.0, 3.0]);
        assert!(info.within_bounds);
    }

    #[test]
    fn test_odd_samples_center_on_nearest() {
        let info = coords().get_nearest_indices(2.3, 3);
        assert_eq!(info.indices, vec![1, 2, 3]);
        let info = coords().get_nearest_indices(1.8, 1);
        assert_eq!(info.indices, vec![2]);
    }

    #[test]
    fn test_clipped_indices_keep_grid_positions() {
        let info = coords().get_nearest_indices(-0.7, 2);
        assert_eq!(info.indices, vec![0, 0]);
        assert_eq!(info.positions, vec![-1.0, 0.0]);
        assert!(!info.within_bounds);

        let info = coords().get_nearest_indices(4.0, 2);
        assert_eq!(info.indices, vec![4, 4]);
        assert_eq!(info.positions, vec![4.0, 5.0]);
    }
}
