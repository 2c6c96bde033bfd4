// Adapters layer: concrete writers behind the ArraySink port.

#[cfg(feature = "netcdf")]
pub mod netcdf_sink;

#[cfg(feature = "netcdf")]
pub use netcdf_sink::NetcdfSink;
