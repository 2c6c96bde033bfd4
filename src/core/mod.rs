pub mod convert;
pub mod dataset;
pub mod descriptor;
pub mod grid;
pub mod metadata;
pub mod source;
pub mod time;

pub use crate::domain::model::{AttributeValue, Attributes};
pub use crate::domain::ports::ArraySink;
pub use crate::utils::error::Result;
