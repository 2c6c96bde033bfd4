#[cfg(feature = "cli")]
pub mod cli;
pub mod lookup;
pub mod toml_config;

use crate::domain::model::{AttributeValue, Attributes};
use std::path::{Path, PathBuf};

/// Turn `key:value` tokens into global attribute overrides. Tokens that do
/// not contain exactly one `:` are skipped.
pub fn parse_attribute_overrides<I, T>(tokens: I) -> Attributes
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut attributes = Attributes::new();
    for token in tokens {
        let token = token.as_ref();
        match token.split_once(':') {
            Some((key, value)) if !value.contains(':') && !key.is_empty() => {
                attributes.insert(key.to_string(), AttributeValue::from(value));
            }
            _ => tracing::debug!("Ignoring argument '{}' (not key:value)", token),
        }
    }
    attributes
}

/// Input path with its extension replaced by `.nc`, in the input's directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("nc")
}
