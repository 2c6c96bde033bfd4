use crate::domain::model::{AttributeValue, Attributes};
use crate::utils::error::{ConvertError, Result};
use crate::utils::validation::{validate_attribute_name, validate_path, validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

/// Optional settings file for batch conversions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    #[serde(default)]
    pub conversion: ConversionSection,
    #[serde(default)]
    pub attributes: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionSection {
    pub chunked: Option<bool>,
    pub max_memory_bytes: Option<usize>,
    pub lookup: Option<PathBuf>,
}

impl ConversionSettings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Replace `${NAME}` with the environment value; unknown names are kept.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn attributes(&self) -> Attributes {
        self.attributes
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => AttributeValue::Text(s.clone()),
                    toml::Value::Integer(i) => AttributeValue::Int(*i),
                    toml::Value::Float(f) => AttributeValue::Float(*f),
                    other => AttributeValue::Text(other.to_string()),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

impl Validate for ConversionSettings {
    fn validate(&self) -> Result<()> {
        if let Some(max_memory) = self.conversion.max_memory_bytes {
            validate_positive_number("conversion.max_memory_bytes", max_memory, 4)?;
        }
        if let Some(lookup) = &self.conversion.lookup {
            validate_path("conversion.lookup", &lookup.to_string_lossy())?;
        }
        for key in self.attributes.keys() {
            validate_attribute_name("attributes", key)?;
        }
        Ok(())
    }
}
