use crate::domain::model::{AttributeValue, Attributes};
use crate::utils::error::Result;
use ndarray::Array3;

/// Destination of a conversion. The converter calls the define methods
/// first, then the data methods, then `finish` exactly once on success.
pub trait ArraySink {
    fn add_global_attribute(&mut self, name: &str, value: &AttributeValue) -> Result<()>;

    fn add_dimension(&mut self, name: &str, len: usize) -> Result<()>;

    fn add_variable(
        &mut self,
        name: &str,
        dimensions: &[&str],
        fill_value: f32,
        attributes: &Attributes,
    ) -> Result<()>;

    fn put_coordinate(&mut self, name: &str, values: &[f64]) -> Result<()>;

    /// Write `data` (time, lat, lon) starting at time index `t0`.
    fn put_field(&mut self, name: &str, t0: usize, data: &Array3<f32>) -> Result<()>;

    fn finish(self) -> Result<()>
    where
        Self: Sized;
}
