//! Axis aligned bounds for real-vector coordinates

/// Lower and upper bound per coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct RealVectorBounds {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl RealVectorBounds {
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        debug_assert_eq!(low.len(), high.len());
        RealVectorBounds { low, high }
    }

    /// Same `[low, high]` interval on every axis
    pub fn uniform(dimension: usize, low: f64, high: f64) -> Self {
        RealVectorBounds {
            low: vec![low; dimension],
            high: vec![high; dimension],
        }
    }

    pub fn dimension(&self) -> usize {
        self.low.len()
    }

    pub fn extents(&self) -> Vec<f64> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(lo, hi)| hi - lo)
            .collect()
    }

    /// Product of the extents. An empty box has volume 1.
    pub fn volume(&self) -> f64 {
        self.extents().iter().product()
    }

    /// Length of the box diagonal
    pub fn maximum_extent(&self) -> f64 {
        self.extents().iter().map(|e| e * e).sum::<f64>().sqrt()
    }

    /// Bounds restricted to coordinates `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Self {
        RealVectorBounds {
            low: self.low[start..end].to_vec(),
            high: self.high[start..end].to_vec(),
        }
    }

    pub fn contains(&self, coords: &[f64]) -> bool {
        coords
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(x, (lo, hi))| *x >= *lo && *x <= *hi)
    }

    pub fn clamp(&self, coords: &mut [f64]) {
        for (x, (lo, hi)) in coords.iter_mut().zip(self.low.iter().zip(self.high.iter())) {
            *x = x.max(*lo).min(*hi);
        }
    }
}
