use ndarray::Array1;

/// A linear axis definition: `count` points starting at `origin`,
/// spaced by `increment`. Values are only materialised on request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearAxis {
    pub count: usize,
    pub origin: f64,
    pub increment: f64,
}

impl LinearAxis {
    pub fn new(count: usize, origin: f64, increment: f64) -> Self {
        Self {
            count,
            origin,
            increment,
        }
    }

    /// `origin + i * increment` for `i` in `0..count`.
    pub fn values(&self) -> Array1<f64> {
        (0..self.count)
            .map(|i| self.origin + i as f64 * self.increment)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Spatial geometry of a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub lon: LinearAxis,
    pub lat: LinearAxis,
    pub level: LinearAxis,
}

impl Grid {
    /// Number of values in one horizontal field.
    pub fn field_size(&self) -> usize {
        self.lon.count * self.lat.count
    }
}
