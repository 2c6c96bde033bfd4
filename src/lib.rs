pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

#[cfg(feature = "netcdf")]
pub use adapters::NetcdfSink;

pub use crate::core::convert::{ConversionSummary, Converter, ReadPlan};
pub use crate::core::dataset::{Dataset, Variable, VariableData, VariableKind};
pub use crate::core::metadata::LookupTable;
pub use utils::error::{ConvertError, Result};
